use anyhow::{Result, bail};
use chrono::Duration;

/// Parse a backend duration string into a [`Duration`].
///
/// Accepts bare seconds (`"3600"`) or one or more `<n><unit>` groups with
/// units `s`, `m`, `h`, `d` (`"10m"`, `"1h30m"`).
pub fn parse_ttl(ttl: &str) -> Result<Duration> {
    let ttl = ttl.trim();
    if ttl.is_empty() {
        bail!("ttl must not be empty");
    }
    if let Ok(secs) = ttl.parse::<i64>() {
        if secs < 0 {
            bail!("ttl '{}' must not be negative", ttl);
        }
        return Ok(Duration::seconds(secs));
    }

    let mut total: i64 = 0;
    let mut digits = String::new();
    for c in ttl.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86_400,
            _ => bail!("ttl '{}' has unknown unit '{}'", ttl, c),
        };
        if digits.is_empty() {
            bail!("ttl '{}' has unit '{}' without a value", ttl, c);
        }
        let value: i64 = digits.parse()?;
        total = value
            .checked_mul(unit)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| anyhow::anyhow!("ttl '{}' is out of range", ttl))?;
        digits.clear();
    }
    if !digits.is_empty() {
        bail!("ttl '{}' ends with a value but no unit", ttl);
    }
    Ok(Duration::seconds(total))
}
