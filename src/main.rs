use anyhow::Result;
use carbon_dashboard::{
    cli::{Cli, Commands, InputArgs},
    config::Config,
    dataset::load_dashboard,
    estimate::EmissionFactors,
    scenario::{read_edit_script, ReassignPolicy},
    schema::ALL_TABLES,
    writer::{export_to_json, export_to_sqlite},
    ui::Totals,
    ConsoleUi, Ui, UiApp,
};
use std::path::PathBuf;
use std::time::Instant;

enum Action {
    Sqlite(PathBuf),
    Json { output: PathBuf, pretty: bool },
    Simulate { edits: PathBuf, policy: ReassignPolicy },
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let (input, action) = match cli.command {
        Commands::Estimate { output_db, input } => (input, Action::Sqlite(output_db)),
        Commands::ExportJson {
            output,
            pretty,
            input,
        } => (input, Action::Json { output, pretty }),
        Commands::Simulate {
            edits,
            reassign_policy,
            input,
        } => (
            input,
            Action::Simulate {
                edits,
                policy: reassign_policy,
            },
        ),

        Commands::Categories => {
            println!("Emission coefficients by usage category:\n");
            for (category, coefficient) in EmissionFactors::standard().iter() {
                println!("  {:<24} {:.3}", category, coefficient);
            }
            return Ok(());
        }

        Commands::ListTables => {
            println!("Output tables:\n");
            for table in ALL_TABLES {
                println!("  {:<20} {}", table.name, table.description);
            }
            return Ok(());
        }

        Commands::ShowConfig { input } => {
            print!("{}", resolve_config(&input)?.to_toml()?);
            return Ok(());
        }
    };

    let config = resolve_config(&input)?;

    if input.tui {
        let mut ui = UiApp::new()?;
        match run(&config, action, &mut ui) {
            Ok(summary) => ui.finish(&summary),
            Err(err) => {
                ui.restore()?;
                Err(err)
            }
        }
    } else {
        let mut ui = ConsoleUi::new();
        let summary = run(&config, action, &mut ui)?;
        println!("\n{}", summary);
        Ok(())
    }
}

fn resolve_config(input: &InputArgs) -> Result<Config> {
    let mut config = Config::load(input.config.as_deref())?;
    if let Some(dir) = &input.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(policy) = input.geometry_policy {
        config.geometry_policy = policy;
    }
    Ok(config)
}

fn run(config: &Config, action: Action, ui: &mut impl Ui) -> Result<String> {
    let start = Instant::now();
    let dashboard = load_dashboard(config, EmissionFactors::standard(), ui)?;

    ui.log(format!(
        "Total Carbon Emissions: {:.2} units",
        dashboard.total_emissions()
    ));
    ui.log(format!(
        "Total Carbon Absorption: {:.2} tons",
        dashboard.total_absorption()
    ));

    let summary = match action {
        Action::Sqlite(output_db) => {
            let record_count = export_to_sqlite(&dashboard, &output_db, ui)?;
            format!(
                "Created {:?} ({} records) in {:.1}s",
                output_db,
                record_count,
                start.elapsed().as_secs_f64()
            )
        }

        Action::Json { output, pretty } => {
            export_to_json(&dashboard, &output, pretty, ui)?;
            format!("Wrote {:?} in {:.1}s", output, start.elapsed().as_secs_f64())
        }

        Action::Simulate { edits, policy } => {
            let edits = read_edit_script(&edits)?;
            let mut scenario = dashboard.scenario(policy);
            ui.log(format!("Reassign policy: {:?}", scenario.policy()));

            let absorption = dashboard.total_absorption();
            for (i, edit) in edits.iter().enumerate() {
                let summary = scenario.apply(edit)?;
                ui.set_totals(Totals {
                    emissions: summary.total_emissions,
                    absorption,
                    tiers: summary.tier_counts,
                });
                let counts = summary.tier_counts;
                ui.log(format!(
                    "Edit {}: {} (green {}, red {}, black {})",
                    i + 1,
                    summary.total_label(),
                    counts.green,
                    counts.red,
                    counts.black
                ));
            }

            let final_summary = scenario.summary();
            format!(
                "Applied {} edits: {} (was {:.2})",
                edits.len(),
                final_summary.total_label(),
                dashboard.total_emissions()
            )
        }
    };

    Ok(summary)
}
