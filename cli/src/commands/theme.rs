use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use pantry_core::theme::{Theme, ThemeService};

pub(crate) async fn cmd_theme(theme_svc: &mut ThemeService, toggle: bool, json: bool) -> Result<()> {
    let theme = if toggle {
        theme_svc.toggle().await?
    } else {
        theme_svc.theme()
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "theme": theme,
                "palette": theme.palette(),
            }))?
        );
    } else {
        print_palette(theme);
    }

    Ok(())
}

fn print_palette(theme: Theme) {
    #[derive(Tabled)]
    struct ColorRow {
        #[tabled(rename = "Element")]
        element: &'static str,
        #[tabled(rename = "Color")]
        color: &'static str,
    }

    let palette = theme.palette();
    let rows = [
        ColorRow {
            element: "background",
            color: palette.background,
        },
        ColorRow {
            element: "text",
            color: palette.text,
        },
        ColorRow {
            element: "toolbar",
            color: palette.toolbar_background,
        },
        ColorRow {
            element: "item",
            color: palette.item_background,
        },
        ColorRow {
            element: "card",
            color: palette.card_background,
        },
    ];

    println!("Theme: {theme}");
    println!("{}", Table::new(&rows).with(Style::rounded()));
}
