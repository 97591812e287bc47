use std::{
    io::{BufRead, Write},
    str::FromStr,
};

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    api::{CoinGeckoClient, PriceSource},
    display::{
        export_history_csv, render_coin_details, render_history, render_holdings,
        render_change_chart, render_market_summary, render_market_table, render_price_chart,
        render_price_history, render_summary, render_valuation,
    },
    errors::AppError,
    functions::PortfolioSummary,
    structs::{summarize_market, AssetId, PortfolioLedger, PriceMap, Transaction},
};

const MENU: &str = "
===== cryptofolio =====
1. Market table
2. Market summary
3. Coin details
4. Buy
5. Sell
6. Portfolio
7. History
8. Export history to CSV
9. Price charts
0. Exit
> ";

const PRICE_HISTORY_DAYS: u32 = 7;
const CHART_MAX_COINS: u32 = 50;

/* Interactive driver: one ledger, a price source for trades and valuation, and the market client when online */
pub struct App<'a> {
    ledger: PortfolioLedger,
    prices: &'a dyn PriceSource,
    market: Option<&'a CoinGeckoClient>,
    vs_currency: String,
    market_limit: u32,
    export_path: String,
}

impl<'a> App<'a> {
    pub fn new(
        prices: &'a dyn PriceSource,
        market: Option<&'a CoinGeckoClient>,
        vs_currency: &str,
        market_limit: u32,
        export_path: &str,
    ) -> Self {
        Self {
            ledger: PortfolioLedger::new(),
            prices,
            market,
            vs_currency: vs_currency.to_string(),
            market_limit,
            export_path: export_path.to_string(),
        }
    }

    pub fn ledger(&self) -> &PortfolioLedger {
        &self.ledger
    }

    /* Runs until "0" or the end of the input. A failing action is reported and the menu goes on. */
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<(), AppError> {
        loop {
            write!(output, "{MENU}")?;
            output.flush()?;
            let Some(choice) = read_line(&mut input)? else {
                break;
            };

            let result = match choice.as_str() {
                "1" => self.show_market(&mut output),
                "2" => self.show_market_summary(&mut output),
                "3" => self.show_coin_details(&mut input, &mut output),
                "4" => self.trade(&mut input, &mut output, Side::Buy),
                "5" => self.trade(&mut input, &mut output, Side::Sell),
                "6" => self.show_portfolio(&mut output),
                "7" => write!(output, "{}", render_history(self.ledger.history())).map_err(AppError::from),
                "8" => self.export_history(&mut output),
                "9" => self.show_charts(&mut input, &mut output),
                "0" => break,
                other => writeln!(output, "Unknown option '{other}'").map_err(AppError::from),
            };

            if let Err(e) = result {
                warn!(error = %e, "menu action failed");
                writeln!(output, "Error: {e}")?;
            }
        }
        writeln!(output, "Bye!")?;
        Ok(())
    }

    fn market(&self) -> Result<&'a CoinGeckoClient, AppError> {
        self.market.ok_or(AppError::Offline)
    }

    fn show_market<W: Write>(&self, output: &mut W) -> Result<(), AppError> {
        let coins = self.market()?.market_data(1, self.market_limit)?;
        write!(
            output,
            "{}",
            render_market_table(&coins, self.market_limit as usize, &self.vs_currency)
        )?;
        Ok(())
    }

    fn show_market_summary<W: Write>(&self, output: &mut W) -> Result<(), AppError> {
        let coins = self.market()?.market_data(1, self.market_limit)?;
        write!(output, "{}", render_market_summary(summarize_market(&coins).as_ref()))?;
        Ok(())
    }

    fn show_coin_details<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), AppError> {
        let market = self.market()?;
        let asset_id = AssetId::new(&prompt(input, output, "Coin id (e.g. bitcoin): ")?)?;
        let details = market.coin_details(&asset_id)?;
        write!(output, "{}", render_coin_details(&details))?;

        // The details are already shown, a failing history only costs the extra lines
        match market.historical_prices(&asset_id, PRICE_HISTORY_DAYS) {
            Ok(points) => {
                writeln!(output, "\nLast {PRICE_HISTORY_DAYS} days:")?;
                write!(output, "{}", render_price_history(&points))?;
            }
            Err(e) => warn!(%asset_id, error = %e, "could not fetch price history"),
        }
        Ok(())
    }

    fn show_charts<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<(), AppError> {
        let market = self.market()?;
        let top_n = parse_chart_size(&prompt(
            input,
            output,
            &format!("How many coins (1-{CHART_MAX_COINS}): "),
        )?)?;

        let coins = market.market_data(1, top_n)?;
        write!(output, "{}", render_price_chart(&coins, top_n as usize, &self.vs_currency))?;
        writeln!(output)?;
        write!(output, "{}", render_change_chart(&coins, top_n as usize))?;
        Ok(())
    }

    fn trade<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
        side: Side,
    ) -> Result<(), AppError> {
        let asset_id = AssetId::new(&prompt(input, output, "Coin id (e.g. bitcoin): ")?)?;
        let quantity = parse_quantity(&prompt(input, output, "Quantity: ")?)?;
        let unit_price = self
            .prices
            .resolve_one(&asset_id)?
            .ok_or_else(|| AppError::PriceUnavailable(asset_id.to_string()))?;

        let tx: Transaction = match side {
            Side::Buy => self.ledger.buy(&asset_id, quantity, unit_price)?,
            Side::Sell => self.ledger.sell(&asset_id, quantity, unit_price)?,
        };
        info!(id = %tx.id(), kind = %tx.kind(), %asset_id, %quantity, %unit_price, "transaction recorded");
        writeln!(output, "{tx}")?;
        Ok(())
    }

    fn show_portfolio<W: Write>(&self, output: &mut W) -> Result<(), AppError> {
        let ids = self.ledger.asset_ids();
        // Without prices every holding is reported as unpriced rather than failing the whole view
        let prices = match self.prices.resolve(&ids) {
            Ok(prices) => prices,
            Err(e) => {
                warn!(error = %e, "could not resolve prices");
                writeln!(output, "Prices unavailable: {e}")?;
                PriceMap::new()
            }
        };
        let valuation = self.ledger.valuation(&prices)?;

        write!(output, "{}", render_holdings(&self.ledger.holdings_snapshot()))?;
        writeln!(output)?;
        write!(output, "{}", render_valuation(&valuation))?;
        writeln!(output)?;
        write!(
            output,
            "{}",
            render_summary(&PortfolioSummary::from_ledger(&self.ledger, &valuation)?)
        )?;
        Ok(())
    }

    fn export_history<W: Write>(&self, output: &mut W) -> Result<(), AppError> {
        export_history_csv(self.ledger.history(), &self.export_path)?;
        info!(path = %self.export_path, transactions = self.ledger.history().len(), "history exported");
        writeln!(
            output,
            "{} transactions exported to {}",
            self.ledger.history().len(),
            self.export_path
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Buy,
    Sell,
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>, AppError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String, AppError> {
    write!(output, "{label}")?;
    output.flush()?;
    read_line(input)?.ok_or_else(|| AppError::InvalidInput("input ended".to_string()))
}

fn parse_quantity(raw: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(raw).map_err(|_| AppError::InvalidInput(format!("'{raw}' is not a number")))
}

fn parse_chart_size(raw: &str) -> Result<u32, AppError> {
    raw.parse::<u32>()
        .ok()
        .filter(|n| (1..=CHART_MAX_COINS).contains(n))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "'{raw}' is not a number between 1 and {CHART_MAX_COINS}"
            ))
        })
}
