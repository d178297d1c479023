use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::settings::{
    load_settings, load_stored_settings, save_settings, shellexpand_path, Mode, API_URL_ENV,
};

pub fn run(mode: Option<Mode>, api_url: Option<String>, export_dir: Option<String>) -> Result<()> {
    let mut settings = load_stored_settings();
    let changed = mode.is_some() || api_url.is_some() || export_dir.is_some();

    if let Some(mode) = mode {
        settings.mode = mode;
    }
    if let Some(url) = api_url {
        settings.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = export_dir {
        settings.export_dir = shellexpand_path(&dir);
    }

    if changed {
        save_settings(&settings)?;
        println!("Settings saved.");
    }

    let settings = load_settings();

    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec![Cell::new("mode"), Cell::new(settings.mode)]);
    table.add_row(vec![Cell::new("api_url"), Cell::new(&settings.api_url)]);
    table.add_row(vec![Cell::new("export_dir"), Cell::new(&settings.export_dir)]);
    println!("{table}");

    if std::env::var(API_URL_ENV).is_ok() {
        println!("(api_url overridden by {API_URL_ENV})");
    }
    Ok(())
}
