use super::ui;
use crate::core::{
    CompareError, CompareRequest, Comparison, ComparisonEngine, Quote, RateProvider, RateSnapshot,
};
use anyhow::Result;
use comfy_table::{Attribute, Cell};

const DISCLAIMER: &str = "Fees and spreads are estimates. \
    Always confirm the final amount with the provider before sending.";

pub async fn run(
    engine: &ComparisonEngine,
    rates: &dyn RateProvider,
    request: &CompareRequest,
) -> Result<()> {
    let spinner = ui::new_spinner(&format!(
        "Fetching {} -> {} mid-market rate",
        request.source_currency, request.dest_currency
    ));
    let outcome = engine.compare_with_rates(rates, request).await;
    spinner.finish_and_clear();

    match outcome {
        Ok((snapshot, comparison)) => {
            println!("{}", render_comparison(&comparison, &snapshot));
            Ok(())
        }
        Err(CompareError::NoProvidersAvailable { from, to }) => {
            println!(
                "{}",
                ui::style_text(
                    &format!("No providers available for {from} -> {to} with these filters."),
                    ui::StyleType::Error
                )
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Headline picks, the ranked table and the footnotes, as printed by `compare`.
pub fn render_comparison(comparison: &Comparison, snapshot: &RateSnapshot) -> String {
    let source = comparison.source_currency;
    let dest = comparison.dest_currency;
    let mut lines = Vec::new();

    let title = format!(
        "Sending {} to {dest}",
        ui::format_money(comparison.source_amount, source)
    );
    lines.push(format!("\n{}", ui::style_text(&title, ui::StyleType::Title)));
    lines.push(format!(
        "Mid-market rate: 1 {source} = {} {dest} (as of {}). \
         At this rate the recipient would get {}.",
        snapshot.rate,
        snapshot.as_of,
        ui::format_money(comparison.mid_market_value(), dest)
    ));
    if let Some(method) = comparison.delivery_method {
        lines.push(format!("Delivery: {method} only"));
    }
    lines.push(String::new());

    lines.push(headline("Best amount", &comparison.best_overall));
    lines.push(match &comparison.best_to_mpesa {
        Some(quote) => headline("Best to M-Pesa", quote),
        None => ui::style_text(
            "Best to M-Pesa: no provider delivers to M-Pesa",
            ui::StyleType::Subtle,
        ),
    });
    lines.push(format!(
        "{} {} ({})",
        ui::style_text("Fastest:", ui::StyleType::Label),
        comparison.fastest.provider_name,
        comparison.fastest.delivery_speed
    ));

    lines.push(format!("\n{}", quote_table(comparison)));

    let best = &comparison.best_overall;
    if let Some(url) = &best.url {
        lines.push(format!("Send with {}: {url}", best.provider_name));
    }
    lines.push(ui::style_text(DISCLAIMER, ui::StyleType::Subtle));
    lines.join("\n")
}

fn headline(label: &str, quote: &Quote) -> String {
    format!(
        "{} {} gives {} ({}% true cost, {} less than mid-market)",
        ui::style_text(&format!("{label}:"), ui::StyleType::Label),
        quote.provider_name,
        ui::style_text(
            &ui::format_money(quote.recipient_gets, quote.dest_currency),
            ui::StyleType::Highlight
        ),
        quote.true_cost_percent_display(),
        ui::format_money(quote.shortfall_vs_mid_market(), quote.dest_currency)
    )
}

fn quote_table(comparison: &Comparison) -> comfy_table::Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Provider"),
        ui::header_cell(&format!("Fee ({})", comparison.source_currency)),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("Recipient gets ({})", comparison.dest_currency)),
        ui::header_cell("True cost"),
        ui::header_cell("Speed"),
        ui::header_cell("Delivery"),
    ]);

    for (rank, quote) in comparison.quotes.iter().enumerate() {
        let mut name = Cell::new(&quote.provider_name);
        if rank == 0 {
            name = name.add_attribute(Attribute::Bold);
        }
        let methods = quote
            .delivery_methods
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(rank + 1),
            name,
            ui::amount_cell(quote.fee_amount),
            Cell::new(quote.effective_rate.round_dp(4)),
            ui::amount_cell(quote.recipient_gets),
            ui::cost_cell(quote.true_cost_percent_display()),
            Cell::new(quote.delivery_speed),
            Cell::new(methods),
        ]);
    }
    table
}
