use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::pak::{Manifest, Spec, UpgradableSpec};

fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();

    table
        // Disable borders
        .load_preset(presets::NOTHING)
        // Enable dynamic sizing for columns
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|header| {
            Cell::new(header)
                .add_attribute(Attribute::Bold)
                .add_attribute(Attribute::Underlined)
        }));

    table
}

/// One row per published version of each pak, in the provided order
pub fn specs_table<'a>(specs: impl IntoIterator<Item = (&'a str, &'a Spec)>) -> Table {
    let mut table = table(&["ID", "Version", "Description"]);

    for (id, spec) in specs {
        for version in &spec.versions {
            let version_cell = Cell::new(version).fg(Color::DarkCyan);

            table.add_row([
                Cell::new(id).fg(Color::Yellow),
                if *version == spec.current_version {
                    version_cell.add_attribute(Attribute::Bold)
                } else {
                    version_cell
                },
                Cell::new(&spec.description),
            ]);
        }
    }

    table
}

pub fn installed_table(installed: &[Manifest]) -> Table {
    let mut table = table(&["ID", "Version", "Files", "Release date"]);

    table.add_rows(installed.iter().map(|manifest| {
        [
            Cell::new(&manifest.id).fg(Color::Yellow),
            Cell::new(&manifest.version).fg(Color::DarkCyan),
            Cell::new(manifest.files.len()).fg(Color::Green),
            Cell::new(&manifest.date),
        ]
    }));

    table
}

pub fn upgradable_table(upgradable: &[UpgradableSpec]) -> Table {
    let mut table = table(&["ID", "Installed", "Latest", "Last updated"]);

    table.add_rows(upgradable.iter().map(|pak| {
        [
            Cell::new(&pak.spec.id).fg(Color::Yellow),
            Cell::new(&pak.spec.current_version).fg(Color::DarkCyan),
            Cell::new(&pak.latest_version).fg(Color::Green),
            Cell::new(&pak.last_updated),
        ]
    }));

    table
}
