use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};

use cancer_trends::{ChartKind, Dashboard, DashboardConfig, TableKind, Trigger};

#[derive(Parser)]
#[command(name = "cancer-trends", version, about = "Cancer incidence and survival chart data")]
struct Cli {
    /// JSON config; defaults apply for missing keys
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the config's data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the selectable values of one table
    Options {
        #[arg(long, value_enum)]
        table: TableArg,
    },
    /// Print the filter panel of one chart
    Panel {
        #[arg(long, value_enum)]
        chart: ChartArg,
    },
    /// Render one chart request as JSON
    Render {
        /// Chart to select; omit to re-apply filters to --previous
        #[arg(long, value_enum)]
        chart: Option<ChartArg>,

        #[arg(long, value_enum, default_value_t = ChartArg::Trend)]
        previous: ChartArg,

        /// Criteria as JSON, e.g. '{"site":"Lung","sex":"Both"}'
        #[arg(long, default_value = "{}")]
        criteria: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TableArg {
    Incidence,
    IncidenceByAge,
    Region,
    Survival,
    ProvinceRegion,
}

impl From<TableArg> for TableKind {
    fn from(arg: TableArg) -> Self {
        match arg {
            TableArg::Incidence => TableKind::Incidence,
            TableArg::IncidenceByAge => TableKind::IncidenceByAge,
            TableArg::Region => TableKind::Region,
            TableArg::Survival => TableKind::Survival,
            TableArg::ProvinceRegion => TableKind::ProvinceRegion,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChartArg {
    Trend,
    RegionalMap,
    AgeDistribution,
    TopCancers,
    Survival,
}

impl From<ChartArg> for ChartKind {
    fn from(arg: ChartArg) -> Self {
        match arg {
            ChartArg::Trend => ChartKind::Trend,
            ChartArg::RegionalMap => ChartKind::RegionalMap,
            ChartArg::AgeDistribution => ChartKind::AgeDistribution,
            ChartArg::TopCancers => ChartKind::TopCancers,
            ChartArg::Survival => ChartKind::Survival,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    let dashboard = Dashboard::load(config);

    let json = match cli.command {
        Commands::Options { table } => {
            let kind = TableKind::from(table);
            let options = dashboard
                .store()
                .options(kind)
                .map_err(|e| anyhow!("{}: {e}", kind.name()))?;
            serde_json::to_string_pretty(options)?
        }
        Commands::Panel { chart } => {
            serde_json::to_string_pretty(&dashboard.panel(chart.into()))?
        }
        Commands::Render {
            chart,
            previous,
            criteria,
        } => {
            let trigger = chart.map_or(Trigger::ApplyFilters, |c| Trigger::Select(c.into()));
            let (kind, outcome) = dashboard.handle_json(trigger, previous.into(), &criteria);
            log::info!("Rendered {}", kind.name());
            serde_json::to_string_pretty(&outcome)?
        }
    };
    println!("{json}");
    Ok(())
}
