use anyhow::{Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::warn;
use salmon_signals::auth::{self, DigestCredentials, Session};
use salmon_signals::loader::{LoadOutcome, normalize_column_name};
use salmon_signals::models::columns;
use salmon_signals::viz::{self, ChartKind, ChartOptions, LegendMode};
use salmon_signals::{AggFunc, Loader, Selection, Settings, Table};
use salmon_signals::{layers, pipeline, preview, regions, stats, storage};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "salmon-signals",
    version,
    about = "Aggregate, summarize & chart dam salmon counts"
)]
struct Cli {
    /// Settings file (TOML). Defaults to ./salmon-signals.toml, then the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Username, required when [auth] users are configured.
    #[arg(long, global = true, env = "SALMON_SIGNALS_USER")]
    user: Option<String>,
    /// Password for --user.
    #[arg(long, global = true, env = "SALMON_SIGNALS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a dataset and render it as a chart (or print the raw table view).
    Plot(PlotArgs),
    /// Aggregate a dataset and save (or print) the resulting table.
    Aggregate(AggregateArgs),
    /// Print the first rows of a dataset.
    Table(TableArgs),
    /// Print grouped summary statistics.
    Stats(StatsArgs),
    /// List regions and their availability.
    Regions,
    /// Print the SHA-256 digest of a password for the [auth] section.
    HashPassword {
        #[arg(value_name = "PASSWORD")]
        secret: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Line,
    Bar,
    Area,
    Table,
}

impl From<KindArg> for ChartKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Line => ChartKind::Line,
            KindArg::Bar => ChartKind::Bar,
            KindArg::Area => ChartKind::Area,
            KindArg::Table => ChartKind::Table,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LegendArg {
    Inside,
    Right,
    Bottom,
}

impl From<LegendArg> for LegendMode {
    fn from(l: LegendArg) -> Self {
        match l {
            LegendArg::Inside => LegendMode::Inside,
            LegendArg::Right => LegendMode::Right,
            LegendArg::Bottom => LegendMode::Bottom,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Dam count dataset (.csv or .json). Defaults to [data].counts.
    #[arg(long)]
    data: Option<PathBuf>,
    /// Dam point layer (.geojson) joined onto the counts on DAM. Defaults to [data].dams.
    #[arg(long)]
    dams: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SelectArgs {
    /// X-axis column.
    #[arg(long, default_value = columns::DOY)]
    x: String,
    /// Value column (COUNT or DOY_ZSCORE).
    #[arg(long, default_value = columns::COUNT)]
    y: String,
    /// Group-by columns separated by comma or semicolon.
    #[arg(long, default_value = columns::SPECIES)]
    group_by: String,
    /// Aggregation function: mean, median, sum, std.
    #[arg(long, default_value = "mean")]
    agg: String,
    /// Keep every row: group by all columns and skip the reduction.
    #[arg(long, default_value_t = false)]
    no_aggregate: bool,
    /// Column that drives series colors; must be one of the group-by columns.
    #[arg(long)]
    color_by: Option<String>,
    /// Only these species (comma separated).
    #[arg(long)]
    species: Option<String>,
    /// Only these locations (comma separated).
    #[arg(long)]
    locations: Option<String>,
}

#[derive(Args, Debug)]
struct PlotArgs {
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    select: SelectArgs,
    /// Chart type.
    #[arg(long, value_enum, default_value = "line")]
    kind: KindArg,
    /// Output chart path (.svg or .png).
    #[arg(long, default_value = "chart.svg")]
    out: PathBuf,
    /// Width of the plot. Defaults to [chart].width.
    #[arg(long)]
    width: Option<u32>,
    /// Height of the plot. Defaults to [chart].height.
    #[arg(long)]
    height: Option<u32>,
    /// Legend placement. Defaults to [chart].legend.
    #[arg(long, value_enum)]
    legend: Option<LegendArg>,
    /// Locale for tick labels. Defaults to [chart].locale.
    #[arg(long)]
    locale: Option<String>,
    /// Region whose name goes into the chart title.
    #[arg(long, default_value = regions::DEFAULT_REGION)]
    region: String,
}

#[derive(Args, Debug)]
struct AggregateArgs {
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    select: SelectArgs,
    /// Save the aggregated table here; printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

#[derive(Args, Debug)]
struct TableArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Number of rows. Defaults to [chart].preview_rows.
    #[arg(long)]
    rows: Option<usize>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Numeric column to summarize.
    #[arg(long, default_value = columns::COUNT)]
    value: String,
    /// Grouping columns separated by comma or semicolon.
    #[arg(long, default_value = "LOCATION,SPECIES")]
    by: String,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_columns(s: &str) -> Vec<String> {
    parse_list(s).iter().map(|c| normalize_column_name(c)).collect()
}

impl SelectArgs {
    fn selection(&self) -> Selection {
        let func = AggFunc::parse(&self.agg);
        if func.is_none() {
            warn!("unknown aggregation function {:?}; rows are left unreduced", self.agg);
        }
        let set = |s: &Option<String>| -> Option<BTreeSet<String>> {
            s.as_deref().map(|v| parse_list(v).into_iter().collect())
        };
        Selection {
            x: normalize_column_name(&self.x),
            y: normalize_column_name(&self.y),
            aggregate: !self.no_aggregate,
            group_by: parse_columns(&self.group_by),
            func,
            color_by: self.color_by.as_deref().map(normalize_column_name),
            species: set(&self.species),
            locations: set(&self.locations),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match &cli.cmd {
        Command::Regions => return cmd_regions(),
        Command::HashPassword { secret } => {
            println!("{}", auth::digest_hex(secret));
            return Ok(());
        }
        _ => {}
    }

    authenticate(&settings, cli.user.as_deref(), cli.password.as_deref())?;
    match cli.cmd {
        Command::Plot(args) => cmd_plot(&settings, args),
        Command::Aggregate(args) => cmd_aggregate(&settings, args),
        Command::Table(args) => cmd_table(&settings, args),
        Command::Stats(args) => cmd_stats(&settings, args),
        Command::Regions | Command::HashPassword { .. } => Ok(()),
    }
}

fn authenticate(settings: &Settings, user: Option<&str>, password: Option<&str>) -> Result<()> {
    if !settings.auth.enabled() {
        return Ok(());
    }
    let (Some(user), Some(password)) = (user, password) else {
        bail!(
            "login required: pass --user and --password \
             (or SALMON_SIGNALS_USER / SALMON_SIGNALS_PASSWORD)"
        );
    };
    let verifier = DigestCredentials::from_config(&settings.auth);
    let mut session = Session::new();
    if !session.login(&verifier, user, password) {
        bail!("invalid username or password");
    }
    Ok(())
}

fn load_table(settings: &Settings, args: &DataArgs) -> Result<Table> {
    let loader = Loader::from_config(&settings.data);
    let path = args.data.clone().unwrap_or_else(|| settings.data.counts.clone());
    let table = match loader.load_counts(&path)? {
        LoadOutcome::Loaded(t) => Arc::unwrap_or_clone(t),
        LoadOutcome::Unavailable(u) => bail!(
            "dam counts unavailable: {} not found (searched {:?})",
            path.display(),
            u.searched
        ),
    };
    let Some(dams) = args.dams.clone().or_else(|| settings.data.dams.clone()) else {
        return Ok(table);
    };
    let dams_path = loader
        .resolve(&dams)
        .map_err(|searched| {
            anyhow!(
                "dam layer {} not found (searched {:?})",
                dams.display(),
                searched
            )
        })?;
    let sites = layers::load_dam_sites(&dams_path)?;
    layers::join_sites(&table, &sites, columns::DAM)
}

fn cmd_plot(settings: &Settings, args: PlotArgs) -> Result<()> {
    let region = regions::find(&args.region)
        .ok_or_else(|| anyhow!("unknown region: {}", args.region))?;
    if !region.is_available() {
        bail!("{} analysis is coming soon", region.title);
    }
    let table = load_table(settings, &args.data)?;
    let kind = ChartKind::from(args.kind);
    if kind == ChartKind::Table {
        let head = preview::preview(&table, settings.chart.preview_rows);
        print!("{}", preview::render_text(&head));
        return Ok(());
    }

    let selection = args.select.selection();
    let palettes = settings.palette.palettes()?;
    let prepared = pipeline::prepare(
        &table,
        &selection,
        &palettes,
        settings.chart.color_steps,
        kind,
    )?;
    let opts = ChartOptions {
        title: selection.title(region.title, &table),
        x_label: prepared.x_label.clone(),
        y_label: prepared.y_label.clone(),
        width: args.width.unwrap_or(settings.chart.width),
        height: args.height.unwrap_or(settings.chart.height),
        legend: args
            .legend
            .map(LegendMode::from)
            .unwrap_or_else(|| settings.chart.legend_mode()),
        locale: args.locale.unwrap_or_else(|| settings.chart.locale.clone()),
        font: settings.chart.font.clone(),
    };
    viz::render_chart(&prepared.series, kind, &args.out, &opts)?;
    eprintln!(
        "Wrote {} series to {}",
        prepared.series.len(),
        args.out.display()
    );
    Ok(())
}

fn cmd_aggregate(settings: &Settings, args: AggregateArgs) -> Result<()> {
    let table = load_table(settings, &args.data)?;
    let aggregated = pipeline::aggregate_selection(&table, &args.select.selection())?;

    let Some(path) = args.out.as_ref() else {
        print!("{}", preview::render_text(&aggregated.table));
        return Ok(());
    };
    let fmt = match args.format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    match fmt.as_str() {
        "csv" => storage::save_csv(&aggregated.table, path)?,
        "json" => storage::save_json(&aggregated.table, path)?,
        other => bail!("unsupported format: {}", other),
    }
    eprintln!(
        "Saved {} rows to {}",
        aggregated.table.len(),
        path.display()
    );
    Ok(())
}

fn cmd_table(settings: &Settings, args: TableArgs) -> Result<()> {
    let table = load_table(settings, &args.data)?;
    let rows = args.rows.unwrap_or(settings.chart.preview_rows);
    print!("{}", preview::render_text(&preview::preview(&table, rows)));
    Ok(())
}

fn cmd_stats(settings: &Settings, args: StatsArgs) -> Result<()> {
    let table = load_table(settings, &args.data)?;
    let keys = parse_columns(&args.by);
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let summaries =
        stats::grouped_summary(&table, &normalize_column_name(&args.value), &key_refs)?;
    for s in summaries {
        println!(
            "{}  count={} missing={}  min={} max={} mean={} median={}",
            s.key.join(" • "),
            s.count,
            s.missing,
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median)
        );
    }
    Ok(())
}

fn cmd_regions() -> Result<()> {
    for r in regions::REGIONS {
        let status = if r.is_available() {
            "available"
        } else {
            "coming soon"
        };
        println!("{:<26}{:<26}{}", r.slug, r.title, status);
    }
    Ok(())
}
