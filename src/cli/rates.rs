use super::ui;
use crate::core::{Currency, RateError, RateProvider, RateSnapshot};
use comfy_table::{Cell, CellAlignment, Color};
use futures::future::join_all;

/// Fetches every `source -> dest` rate concurrently and prints them.
pub async fn run(rates: &dyn RateProvider, sources: &[Currency], dest: Currency) {
    if sources.is_empty() {
        println!("No provider sends to {dest}.");
        return;
    }

    let pb = ui::new_progress_bar(sources.len() as u64);
    let futures = sources.iter().map(|&from| {
        let pb_clone = pb.clone();
        async move {
            let res = rates.get_rate(from, dest).await;
            pb_clone.inc(1);
            (from, res)
        }
    });
    let results = join_all(futures).await;
    pb.finish_and_clear();

    println!(
        "\n{}",
        ui::style_text(&format!("Mid-market rates to {dest}"), ui::StyleType::Title)
    );
    println!("{}", render_rates(&results, dest));
}

pub fn render_rates(
    results: &[(Currency, Result<RateSnapshot, RateError>)],
    dest: Currency,
) -> comfy_table::Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("As of"),
    ]);

    for (from, result) in results {
        let pair = Cell::new(format!("{from} -> {dest}"));
        match result {
            Ok(snapshot) => table.add_row(vec![
                pair,
                Cell::new(snapshot.rate.round_dp(4)).set_alignment(CellAlignment::Right),
                Cell::new(snapshot.as_of),
            ]),
            Err(e) => table.add_row(vec![pair, ui::na_cell(true), Cell::new(e).fg(Color::Red)]),
        };
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_render_rates_shows_failures_inline() {
        let ok = RateSnapshot {
            from: Currency::USD,
            to: Currency::KES,
            rate: dec!(129.5),
            as_of: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            fetched_at: Utc::now(),
        };
        let results = vec![
            (Currency::USD, Ok(ok)),
            (
                Currency::AED,
                Err(RateError::unavailable(Currency::AED, Currency::KES, "HTTP error: 404")),
            ),
        ];
        let text = render_rates(&results, Currency::KES).to_string();
        assert!(text.contains("USD -> KES"));
        assert!(text.contains("129.5"));
        assert!(text.contains("2026-10-16"));
        assert!(text.contains("N/A"));
        assert!(text.contains("HTTP error: 404"));
    }
}
