use super::ui;
use crate::core::{Currency, ProviderTable};
use comfy_table::{Cell, CellAlignment};

pub fn run(table: &ProviderTable) {
    println!(
        "\n{}",
        ui::style_text("Remittance providers", ui::StyleType::Title)
    );
    println!("{}", render_providers(table));
}

pub fn render_providers(providers: &ProviderTable) -> comfy_table::Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Provider"),
        ui::header_cell("Fee"),
        ui::header_cell("FX margin"),
        ui::header_cell("Delivery"),
        ui::header_cell("Sends from"),
        ui::header_cell("Notes"),
    ]);

    for profile in providers.profiles() {
        let delivery = profile
            .delivery
            .iter()
            .map(|d| format!("{} ({})", d.method, d.speed))
            .collect::<Vec<_>>()
            .join("\n");
        let mut sources: Vec<Currency> = profile.corridors.iter().map(|c| c.from).collect();
        sources.sort();
        sources.dedup();
        let sources = sources
            .iter()
            .map(Currency::code)
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(vec![
            Cell::new(&profile.name),
            Cell::new(profile.fee),
            Cell::new(format!("{}%", profile.spread_percent)).set_alignment(CellAlignment::Right),
            Cell::new(delivery),
            Cell::new(sources),
            profile
                .notes
                .as_ref()
                .map_or_else(|| ui::na_cell(false), Cell::new),
        ]);
    }
    table
}
