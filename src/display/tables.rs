/* Text rendering of the data produced by the ledger and the market API. Every function returns a String and
never touches the data it is given. */

use std::fmt::Write;

use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::{
    functions::PortfolioSummary,
    structs::{
        CoinDetails, Holding, MarketCoin, MarketSummary, PricePoint, Transaction, Valuation,
    },
};

const RULE_WIDTH: usize = 78;
const BAR_WIDTH: usize = 40;
const CHART_LABEL_WIDTH: usize = 24;

pub fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

pub fn quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

fn optional_money(value: Option<Decimal>) -> String {
    value.map_or_else(|| "N/A".to_string(), money)
}

pub fn format_change(change: Option<Decimal>) -> String {
    match change {
        None => "N/A".to_string(),
        Some(c) if c > Decimal::ZERO => format!("▲ +{}%", money(c)),
        Some(c) if c < Decimal::ZERO => format!("▼ {}%", money(c)),
        Some(c) => format!("  {}%", money(c)),
    }
}

fn rule(out: &mut String) {
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
}

pub fn render_market_table(coins: &[MarketCoin], limit: usize, vs_currency: &str) -> String {
    let mut out = String::new();
    if coins.is_empty() {
        out.push_str("No market data available.\n");
        return out;
    }
    let price_header = format!("Price ({})", vs_currency.to_uppercase());
    let _ = writeln!(
        out,
        "{:<5} {:<22} {:<8} {:>16} {:>12} {:>12}",
        "#", "Name", "Symbol", price_header, "24h", "7d"
    );
    rule(&mut out);
    for coin in coins.iter().take(limit) {
        let rank = coin
            .market_cap_rank
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        let _ = writeln!(
            out,
            "{:<5} {:<22} {:<8} {:>16} {:>12} {:>12}",
            rank,
            coin.name,
            coin.symbol,
            optional_money(coin.current_price),
            format_change(coin.change_24h),
            format_change(coin.change_7d),
        );
    }
    rule(&mut out);
    out
}

/* Length of the bar for `value` on a scale where `max` fills `width`. Any positive value gets at least one block. */
fn bar_length(value: Decimal, max: Decimal, width: usize) -> usize {
    if value <= Decimal::ZERO || max <= Decimal::ZERO {
        return 0;
    }
    let ratio = value
        .checked_div(max)
        .unwrap_or(Decimal::ONE)
        .min(Decimal::ONE);
    let length = ratio
        .checked_mul(Decimal::from(width))
        .and_then(|l| l.round().to_usize())
        .unwrap_or(width);
    length.max(1)
}

fn chart_label(coin: &MarketCoin) -> String {
    format!("{} - {}", coin.symbol, coin.name)
        .chars()
        .take(CHART_LABEL_WIDTH)
        .collect()
}

/* Horizontal bars of the current price of the first `top_n` coins of the listing */
pub fn render_price_chart(coins: &[MarketCoin], top_n: usize, vs_currency: &str) -> String {
    let coins: Vec<&MarketCoin> = coins.iter().take(top_n).collect();
    if coins.is_empty() {
        return "No data available for chart.\n".to_string();
    }
    let max = coins
        .iter()
        .filter_map(|c| c.current_price)
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Top {} cryptocurrencies by price ({})",
        coins.len(),
        vs_currency.to_uppercase()
    );
    rule(&mut out);
    for coin in coins {
        let bar = coin
            .current_price
            .map_or(0, |price| bar_length(price, max, BAR_WIDTH));
        let _ = writeln!(
            out,
            "{:<label$} {:<bar_width$} {}",
            chart_label(coin),
            "█".repeat(bar),
            optional_money(coin.current_price),
            label = CHART_LABEL_WIDTH,
            bar_width = BAR_WIDTH,
        );
    }
    out
}

/* Bars of the 24h change around a zero axis: losses grow to the left, gains to the right */
pub fn render_change_chart(coins: &[MarketCoin], top_n: usize) -> String {
    let coins: Vec<&MarketCoin> = coins.iter().take(top_n).collect();
    if coins.is_empty() {
        return "No data available for chart.\n".to_string();
    }
    let half = BAR_WIDTH / 2;
    let max = coins
        .iter()
        .filter_map(|c| c.change_24h)
        .map(|c| c.abs())
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut out = String::new();
    let _ = writeln!(out, "24-hour price changes, top {}", coins.len());
    rule(&mut out);
    for coin in coins {
        let change = coin.change_24h.unwrap_or(Decimal::ZERO);
        let losses = bar_length(-change, max, half);
        let gains = bar_length(change, max, half);
        let _ = writeln!(
            out,
            "{:<label$} {:>half$}│{:<half$} {}",
            chart_label(coin),
            "█".repeat(losses),
            "█".repeat(gains),
            format_change(coin.change_24h),
            label = CHART_LABEL_WIDTH,
        );
    }
    out
}

pub fn render_market_summary(summary: Option<&MarketSummary>) -> String {
    let Some(summary) = summary else {
        return "Not enough data for a market summary.\n".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(out, "Market performance (24h)");
    rule(&mut out);
    let _ = writeln!(
        out,
        "Top gainer: {} ({}) {}",
        summary.top_gainer.name,
        summary.top_gainer.symbol,
        format_change(summary.top_gainer.change_24h)
    );
    let _ = writeln!(
        out,
        "Top loser:  {} ({}) {}",
        summary.top_loser.name,
        summary.top_loser.symbol,
        format_change(summary.top_loser.change_24h)
    );
    rule(&mut out);
    out
}

pub fn render_coin_details(details: &CoinDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", details.name, details.symbol);
    rule(&mut out);
    let _ = writeln!(out, "Price:          {}", optional_money(details.current_price));
    let _ = writeln!(out, "24h change:     {}", format_change(details.change_24h));
    let _ = writeln!(out, "Market cap:     {}", optional_money(details.market_cap));
    let _ = writeln!(out, "Volume (24h):   {}", optional_money(details.total_volume));
    let _ = writeln!(out, "All time high:  {}", optional_money(details.all_time_high));
    let _ = writeln!(out, "All time low:   {}", optional_money(details.all_time_low));
    if let Some(homepage) = &details.homepage {
        let _ = writeln!(out, "Homepage:       {homepage}");
    }
    let description: String = details.description.chars().take(300).collect();
    let _ = writeln!(out, "\n{description}");
    out
}

/* One line per day, the last point of each day wins */
pub fn render_price_history(points: &[PricePoint]) -> String {
    if points.is_empty() {
        return "No price history available.\n".to_string();
    }
    let mut daily: Vec<&PricePoint> = Vec::new();
    for point in points {
        match daily.last_mut() {
            Some(last) if last.timestamp.date_naive() == point.timestamp.date_naive() => *last = point,
            _ => daily.push(point),
        }
    }
    let mut out = String::new();
    for point in daily {
        let _ = writeln!(
            out,
            "{}  {:>16}",
            point.timestamp.format("%Y-%m-%d"),
            money(point.price)
        );
    }
    out
}

pub fn render_holdings(holdings: &[Holding]) -> String {
    if holdings.is_empty() {
        return "No holdings.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:>18} {:>16} {:>16}",
        "Asset", "Quantity", "Avg cost", "Cost basis"
    );
    rule(&mut out);
    for holding in holdings {
        let _ = writeln!(
            out,
            "{:<20} {:>18} {:>16} {:>16}",
            holding.asset_id().as_str(),
            quantity(holding.quantity()),
            money(holding.average_cost()),
            money(holding.cost_basis()),
        );
    }
    out
}

pub fn render_valuation(valuation: &Valuation) -> String {
    if valuation.positions.is_empty() {
        return "No holdings.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:>14} {:>14} {:>14} {:>14}",
        "Asset", "Quantity", "Price", "Value", "Unrealized"
    );
    rule(&mut out);
    for position in &valuation.positions {
        let _ = writeln!(
            out,
            "{:<20} {:>14} {:>14} {:>14} {:>14}",
            position.asset_id.as_str(),
            quantity(position.quantity),
            optional_money(position.price),
            money(position.value),
            optional_money(position.unrealized_profit),
        );
    }
    rule(&mut out);
    let _ = writeln!(out, "Total value: {}", money(valuation.total_value));
    for asset_id in &valuation.unpriced {
        let _ = writeln!(
            out,
            "WARNING: price unavailable for {asset_id}, it is excluded from the total"
        );
    }
    out
}

pub fn render_summary(summary: &PortfolioSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Transactions:      {} buys, {} sells",
        summary.buy_count, summary.sell_count
    );
    let _ = writeln!(out, "Invested:          {}", money(summary.total_invested));
    let _ = writeln!(out, "Proceeds:          {}", money(summary.total_proceeds));
    let _ = writeln!(out, "Realized profit:   {}", money(summary.realized_profit));
    let _ = writeln!(out, "Unrealized profit: {}", money(summary.unrealized_profit));
    if !summary.unpriced.is_empty() {
        let _ = writeln!(out, "(unrealized profit excludes assets without a price)");
    }
    out
}

pub fn render_history(history: &[Transaction]) -> String {
    if history.is_empty() {
        return "No transactions yet.\n".to_string();
    }
    let mut out = String::new();
    for tx in history {
        let _ = writeln!(out, "{tx}");
    }
    out
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::structs::{AssetId, PortfolioLedger, PriceMap};

    use super::*;

    #[test]
    fn test_formatting() {
        assert_eq!(money(dec!(1234.5)), "1234.50");
        assert_eq!(money(dec!(0.125)), "0.12");
        assert_eq!(quantity(dec!(1.500)), "1.5");
        assert_eq!(format_change(Some(dec!(2.345))), "▲ +2.34%");
        assert_eq!(format_change(Some(dec!(-1))), "▼ -1.00%");
        assert_eq!(format_change(None), "N/A");
    }

    fn market_coin(symbol: &str, price: Option<Decimal>, change: Option<Decimal>) -> MarketCoin {
        MarketCoin {
            id: AssetId::new(symbol).unwrap(),
            symbol: symbol.to_uppercase(),
            name: symbol.to_string(),
            current_price: price,
            market_cap: None,
            market_cap_rank: None,
            total_volume: None,
            high_24h: None,
            low_24h: None,
            change_24h: change,
            change_7d: None,
        }
    }

    fn bars(line: &str) -> usize {
        line.matches('█').count()
    }

    #[test]
    fn test_bar_length() {
        assert_eq!(bar_length(dec!(100), dec!(100), 40), 40);
        assert_eq!(bar_length(dec!(50), dec!(100), 40), 20);
        assert_eq!(bar_length(dec!(0.01), dec!(100), 40), 1);
        assert_eq!(bar_length(dec!(0), dec!(100), 40), 0);
        assert_eq!(bar_length(dec!(-5), dec!(100), 40), 0);
        assert_eq!(bar_length(dec!(5), dec!(0), 40), 0);
    }

    #[test]
    fn test_price_chart_scales_to_the_top_price() {
        let coins = vec![
            market_coin("btc", Some(dec!(100)), None),
            market_coin("eth", Some(dec!(50)), None),
            market_coin("doge", Some(dec!(1)), None),
            market_coin("new", None, None),
            market_coin("left", Some(dec!(1000)), None),
        ];
        let text = render_price_chart(&coins, 4, "usd");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Top 4 cryptocurrencies by price (USD)");
        assert_eq!(lines.len(), 6);
        assert_eq!(bars(lines[2]), 40);
        assert!(lines[2].starts_with("BTC - btc"));
        assert!(lines[2].ends_with("100.00"));
        assert_eq!(bars(lines[3]), 20);
        assert_eq!(bars(lines[4]), 1);
        assert_eq!(bars(lines[5]), 0);
        assert!(lines[5].ends_with("N/A"));
        assert!(!text.contains("LEFT"));

        assert_eq!(render_price_chart(&[], 10, "usd"), "No data available for chart.\n");
    }

    #[test]
    fn test_change_chart_splits_gains_and_losses() {
        let coins = vec![
            market_coin("up", None, Some(dec!(10))),
            market_coin("down", None, Some(dec!(-5))),
            market_coin("flat", None, Some(dec!(0))),
            market_coin("small", None, Some(dec!(2.5))),
            market_coin("none", None, None),
        ];
        let text = render_change_chart(&coins, 10);
        let lines: Vec<&str> = text.lines().skip(2).collect();
        let sides = |line: &str| {
            let (left, right) = line.split_once('│').unwrap();
            (bars(left), bars(right))
        };

        assert_eq!(sides(lines[0]), (0, 20));
        assert!(lines[0].ends_with("▲ +10.00%"));
        assert_eq!(sides(lines[1]), (10, 0));
        assert!(lines[1].ends_with("▼ -5.00%"));
        assert_eq!(sides(lines[2]), (0, 0));
        assert_eq!(sides(lines[3]), (0, 5));
        assert_eq!(sides(lines[4]), (0, 0));
        assert!(lines[4].ends_with("N/A"));

        // The zero axis lines up on every row
        let axis: Vec<usize> = lines
            .iter()
            .map(|l| l.chars().position(|c| c == '│').unwrap())
            .collect();
        assert!(axis.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_price_history_keeps_last_point_of_day() {
        use chrono::{TimeZone, Utc};

        let point = |day: u32, hour: u32, price| PricePoint {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            price,
        };
        let text = render_price_history(&[
            point(1, 0, dec!(100)),
            point(1, 12, dec!(110)),
            point(2, 0, dec!(120)),
        ]);
        assert_eq!(text, "2024-03-01            110.00\n2024-03-02            120.00\n");
        assert_eq!(render_price_history(&[]), "No price history available.\n");
    }

    #[test]
    fn test_render_valuation_flags_unpriced() {
        let a = AssetId::new("alpha").unwrap();
        let b = AssetId::new("beta").unwrap();
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&a, dec!(3), dec!(10)).unwrap();
        ledger.buy(&b, dec!(2), dec!(10)).unwrap();
        let prices: PriceMap = [(a, dec!(11))].into_iter().collect();

        let text = render_valuation(&ledger.valuation(&prices).unwrap());
        assert!(text.contains("Total value: 33.00"));
        assert!(text.contains("price unavailable for beta"));
        assert!(!text.contains("price unavailable for alpha"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_holdings(&[]), "No holdings.\n");
        assert_eq!(render_history(&[]), "No transactions yet.\n");
        assert_eq!(render_market_table(&[], 10, "usd"), "No market data available.\n");
        assert!(render_market_summary(None).starts_with("Not enough data"));
    }

    #[test]
    fn test_render_history_and_holdings() {
        let a = AssetId::new("alpha").unwrap();
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&a, dec!(2), dec!(10)).unwrap();
        ledger.sell(&a, dec!(1), dec!(15)).unwrap();

        let history = render_history(ledger.history());
        assert_eq!(history.lines().count(), 2);
        assert!(history.contains("SELL 1 alpha @ 15 (profit: 5)"));

        let holdings = render_holdings(&ledger.holdings_snapshot());
        assert!(holdings.contains("alpha"));
        assert!(holdings.contains("10.00"));
    }
}
