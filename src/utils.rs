use std::time::Duration;

/// Platform sleep: a browser timer on the web, tokio elsewhere
pub async fn sleep(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    {
        gloo_timers::future::sleep(duration).await;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::time::sleep(duration).await;
    }
}

/// Shortens long hashes and notes for table cells: `0xa...f12`
pub fn abbreviate(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 8 {
        return text.to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Renders a server timestamp in the local timezone. Unparseable input is
/// shown as received.
pub fn local_time(timestamp: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed
            .with_timezone(&chrono::Local)
            .format("%d/%m/%Y %H:%M:%S")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// `$1,234.5` style amount, at most three decimals
pub fn usd(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::new();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if frac_part.is_empty() {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{}", sign, grouped, frac_part)
    }
}

/// Table cell for an optional amount
pub fn usd_or_dash(value: Option<f64>) -> String {
    value.map(usd).unwrap_or_else(|| "-".to_string())
}
