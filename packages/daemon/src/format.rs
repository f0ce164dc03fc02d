//! Telegram message formatting (HTML parse mode).

use homescout::{EvaluatedListing, PriceDrop};

/// Format a qualifying-listing announcement.
pub fn format_match(entry: &EvaluatedListing, city_average: Option<f64>) -> String {
    let listing = &entry.listing;
    let mut lines = vec![
        "🏠 <b>NEW HOUSE FOUND!</b> 🏠\n".to_string(),
        format!("📍 <b>Address:</b> {}", listing.address),
        format!("🏙️ <b>City:</b> {}, {}", listing.city, listing.state),
        format!("💰 <b>Price:</b> ${}\n", thousands(listing.price)),
    ];

    let mut details = Vec::new();
    if let Some(beds) = listing.beds {
        details.push(format!("🛏️ {beds} bed"));
    }
    if let Some(baths) = listing.baths {
        details.push(format!("🛁 {baths} bath"));
    }
    if let Some(sqft) = listing.sqft {
        details.push(format!("📏 {} sqft", thousands(sqft)));
    }
    if !details.is_empty() {
        lines.push(details.join(" | ") + "\n");
    }

    let insights = market_insight_lines(listing.days_on_market, listing.price, city_average, &listing.city);
    if !insights.is_empty() {
        lines.push("<b>📊 Market Insights:</b>".to_string());
        lines.extend(insights);
        lines.push(String::new());
    }

    lines.push(format!("<b>✅ Verdict:</b> {}", entry.tier));
    if !entry.rationale.is_empty() {
        lines.push(format!("  {}", entry.rationale));
    }

    lines.join("\n")
}

/// Format the consolation announcement when nothing qualified.
pub fn format_closest_miss(entry: &EvaluatedListing) -> String {
    let listing = &entry.listing;
    let mut lines = vec![
        "🤏 <b>CLOSEST MISS THIS RUN</b>\n".to_string(),
        "Nothing cleared the bar, but this one came nearest:\n".to_string(),
        format!("📍 <b>Address:</b> {}", listing.address),
        format!("🏙️ <b>City:</b> {}, {}", listing.city, listing.state),
        format!("💰 <b>Price:</b> ${}", thousands(listing.price)),
        format!("🎯 <b>Verdict:</b> {}", entry.tier),
    ];
    if !entry.rationale.is_empty() {
        lines.push(format!("  {}", entry.rationale));
    }
    lines.join("\n")
}

/// Format one entry of the price-drop digest.
pub fn format_price_drop(drop: &PriceDrop) -> String {
    [
        "💰📉 <b>PRICE DROP ALERT!</b> 💰📉\n".to_string(),
        format!("📍 <b>Address:</b> {}", drop.address),
        format!("🏙️ <b>City:</b> {}\n", drop.city),
        format!("<b>Old Price:</b> <s>${}</s>", thousands(drop.old_price)),
        format!(
            "<b>New Price:</b> ${} ({:.0}% off)",
            thousands(drop.new_price),
            drop.drop_percent
        ),
    ]
    .join("\n")
}

/// Format the alert sent when a whole cycle fails.
pub fn format_run_failure(error: &str) -> String {
    [
        "🚨 <b>HOUSE HUNT RUN FAILED</b>\n".to_string(),
        format!("<b>Error:</b> {error}"),
        "\nCheck the daemon logs for details.".to_string(),
    ]
    .join("\n")
}

fn market_insight_lines(
    days_on_market: Option<u32>,
    price: u64,
    city_average: Option<f64>,
    city: &str,
) -> Vec<String> {
    let mut lines = Vec::new();

    match days_on_market {
        Some(0) => lines.push("  🆕 Just listed today!".to_string()),
        Some(1) => lines.push("  🆕 Listed yesterday".to_string()),
        Some(d @ 2..=7) => lines.push(format!("  🔥 Listed {d} days ago (fresh!)")),
        Some(d @ 8..=30) => lines.push(format!("  📅 On market {d} days")),
        Some(d @ 31..=60) => lines.push(format!("  ⏰ On market {d} days (getting stale)")),
        Some(d) => lines.push(format!("  ⚠️ On market {d} days (price negotiable?)")),
        None => {}
    }

    if let Some(avg) = city_average {
        if avg > 0.0 {
            let diff_percent = (price as f64 - avg) * 100.0 / avg;
            if diff_percent < -5.0 {
                lines.push(format!(
                    "  💚 {:.0}% below average for {city}!",
                    diff_percent.abs()
                ));
            } else if diff_percent < 5.0 {
                lines.push(format!("  📊 Right at market average for {city}"));
            } else {
                lines.push(format!("  📈 {diff_percent:.0}% above average for {city}"));
            }
        }
    }

    lines
}

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use homescout::{BasementSignal, Listing, ListingState, OutcomeTier};

    fn entry() -> EvaluatedListing {
        EvaluatedListing {
            listing: Listing {
                identity_key: "p1".into(),
                address: "12 Elm St".into(),
                city: "Westlake".into(),
                state: "OH".into(),
                price: 289_000,
                beds: Some(3),
                baths: Some(2.0),
                sqft: Some(1_600),
                age_years: Some(35),
                has_pool: Some(false),
                days_on_market: Some(3),
                listing_url: Some("https://example.com/p1".into()),
                basement_signal: BasementSignal::Finished,
                raw_text_fields: vec![],
            },
            tier: OutcomeTier::CompleteMatch,
            rationale: "Finished basement confirmed in listing details".into(),
            state: ListingState::Notified,
        }
    }

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(thousands(289_000), "289,000");
        assert_eq!(thousands(1_250_000), "1,250,000");
        assert_eq!(thousands(999), "999");
    }

    #[test]
    fn test_match_message_carries_key_facts() {
        let msg = format_match(&entry(), Some(310_000.0));
        assert!(msg.contains("NEW HOUSE FOUND"));
        assert!(msg.contains("12 Elm St"));
        assert!(msg.contains("$289,000"));
        assert!(msg.contains("Listed 3 days ago"));
        assert!(msg.contains("below average for Westlake"));
        assert!(msg.contains("complete_match"));
    }

    #[test]
    fn test_closest_miss_message_is_clearly_not_a_match() {
        let mut e = entry();
        e.tier = OutcomeTier::PartialMatch;
        let msg = format_closest_miss(&e);
        assert!(msg.contains("CLOSEST MISS"));
        assert!(msg.contains("Nothing cleared the bar"));
        assert!(msg.contains("partial_match"));
    }

    #[test]
    fn test_run_failure_message_carries_the_error() {
        let msg = format_run_failure("store unavailable: disk I/O error");
        assert!(msg.contains("RUN FAILED"));
        assert!(msg.contains("disk I/O error"));
    }

    #[test]
    fn test_price_drop_message() {
        let msg = format_price_drop(&PriceDrop {
            identity_key: "p1".into(),
            address: "12 Elm St".into(),
            city: "Westlake".into(),
            old_price: 300_000,
            new_price: 285_000,
            drop_percent: 5.0,
            at: chrono::Utc::now(),
        });
        assert!(msg.contains("PRICE DROP"));
        assert!(msg.contains("<s>$300,000</s>"));
        assert!(msg.contains("5% off"));
    }
}
