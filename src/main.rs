use log::{debug, error, info};
use std::path::{Path, PathBuf};

use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use anyhow::{anyhow, bail, Context, Result};

use clap::{Arg, ArgAction, ArgMatches, Command};
use svd2cpp::{
    config::{ConfigFormat, IdentCase, IDENT_CASE_NAMES},
    generate::generic,
    svd::Device,
    Config,
};

fn parse_configs(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            let format = ConfigFormat::from_path(path)
                .ok_or_else(|| anyhow!("unknown format of config file {}", path.display()))?;
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("couldn't read config file {}", path.display()))?;
            match format {
                #[cfg(feature = "yaml")]
                ConfigFormat::Yaml => serde_yaml::from_str(&text)
                    .with_context(|| format!("invalid config file {}", path.display()))?,
                #[cfg(feature = "json")]
                ConfigFormat::Json => serde_json::from_str(&text)
                    .with_context(|| format!("invalid config file {}", path.display()))?,
            }
        }
        None => Config::default(),
    };

    if let Some(input) = matches.get_one::<PathBuf>("input") {
        config.input = Some(input.clone());
    }
    if let Some(dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = Some(dir.clone());
    }
    if let Some(namespace) = matches.get_one::<String>("namespace") {
        config.namespace = namespace.clone();
    }
    if let Some(case) = matches.get_one::<String>("ident_case") {
        config.ident_case = IdentCase::parse(case)?;
    }
    if let Some(threshold) = matches.get_one::<usize>("enum_threshold") {
        config.enum_threshold = *threshold;
    }
    if let Some(irq) = matches.get_one::<String>("default_irq") {
        config.default_irq = irq.clone();
    }
    if matches.get_flag("check_overlaps") {
        config.check_overlaps = true;
    }
    if matches.get_flag("generic") {
        config.generic_header = true;
    }
    if let Some(level) = matches.get_one::<String>("log_level") {
        config.log_level = Some(level.clone());
    }
    Ok(config)
}

fn run() -> Result<()> {
    let matches = Command::new("svd2cpp")
        .about("Generate C++ register headers from SVD files")
        .arg(
            Arg::new("input")
                .help("Input SVD file (stdin when absent)")
                .short('i')
                .long("input")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(PathBuf))
                .value_name("FILE"),
        )
        .arg(
            Arg::new("peripheral")
                .help("Peripheral to generate a header for")
                .short('p')
                .long("peripheral")
                .action(ArgAction::Append)
                .value_name("NAME"),
        )
        .arg(
            Arg::new("output_dir")
                .help("Directory to place generated headers")
                .short('o')
                .long("output-dir")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(PathBuf))
                .value_name("DIR"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Config file (YAML or JSON)")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(PathBuf))
                .value_name("FILE"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List the peripherals of the device and exit"),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .help("Print the parsed device model and exit")
                .action(ArgAction::Set)
                .value_parser(dump_formats())
                .value_name("FORMAT"),
        )
        .arg(
            Arg::new("generic")
                .long("generic")
                .short('g')
                .action(ArgAction::SetTrue)
                .help(format!("Also write {}", generic::FILE_NAME)),
        )
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .help("Outer namespace of the generated code")
                .action(ArgAction::Set)
                .value_name("NAME"),
        )
        .arg(
            Arg::new("ident_case")
                .long("ident-case")
                .help("Case of generated identifiers")
                .action(ArgAction::Set)
                .value_parser(IDENT_CASE_NAMES)
                .value_name("CASE"),
        )
        .arg(
            Arg::new("enum_threshold")
                .long("enum-threshold")
                .help("Synthesize enumerations for fields with more enumerated values than N")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(usize))
                .value_name("N"),
        )
        .arg(
            Arg::new("default_irq")
                .long("default-irq")
                .help("IRQ of instances without a declared interrupt")
                .action(ArgAction::Set)
                .value_name("IRQ"),
        )
        .arg(
            Arg::new("check_overlaps")
                .long("check-overlaps")
                .action(ArgAction::SetTrue)
                .help("Report fields whose bit ranges overlap"),
        )
        .arg(
            Arg::new("log_level")
                .long("log")
                .short('l')
                .help(format!(
                    "Choose which messages to log (overrides {})",
                    env_logger::DEFAULT_FILTER_ENV
                ))
                .action(ArgAction::Set)
                .value_parser(["off", "error", "warn", "info", "debug", "trace"]),
        )
        .version(env!("CARGO_PKG_VERSION"))
        .get_matches();

    let config = parse_configs(&matches);
    setup_logging(match &config {
        Ok(config) => config.log_level.as_deref(),
        Err(_) => matches.get_one::<String>("log_level").map(String::as_str),
    });
    let config = config?;

    let mut xml = String::new();
    match config.input.as_ref() {
        Some(file) => {
            File::open(file)
                .with_context(|| format!("couldn't open the SVD file {}", file.display()))?
                .read_to_string(&mut xml)
                .context("couldn't read the SVD file")?;
        }
        None => {
            io::stdin()
                .read_to_string(&mut xml)
                .context("couldn't read from stdin")?;
        }
    }

    let (device, diagnostics) =
        svd2cpp::load_from(&xml, &config).context("Error parsing SVD XML file")?;
    if !diagnostics.is_empty() {
        info!("{} SVD records skipped", diagnostics.len());
    }

    if matches.get_flag("list") {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for (name, description) in device.summaries() {
            match description {
                Some(description) => writeln!(out, "{name:<16} {description}")?,
                None => writeln!(out, "{name}")?,
            }
        }
        return Ok(());
    }

    if let Some(format) = matches.get_one::<String>("dump") {
        return dump(&device, format);
    }

    let out_dir = config
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("couldn't create {}", out_dir.display()))?;

    let requested: Vec<&String> = matches
        .get_many::<String>("peripheral")
        .map(|values| values.collect())
        .unwrap_or_default();
    if requested.is_empty() && !config.generic_header {
        bail!("nothing to do: request a peripheral with --peripheral, or --list them");
    }

    for name in requested {
        let header = svd2cpp::render(&device, name, &config)
            .with_context(|| format!("couldn't generate peripheral {name}"))?;
        let file_name = format!("{}_{}.hpp", device.name, name).to_lowercase();
        write_file(&out_dir.join(file_name), &header)?;
    }

    if config.generic_header {
        write_file(&out_dir.join(generic::FILE_NAME), &generic::render(&config))?;
    }

    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("couldn't create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("couldn't write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn dump_formats() -> Vec<&'static str> {
    vec![
        #[cfg(feature = "json")]
        "json",
        #[cfg(feature = "yaml")]
        "yaml",
    ]
}

fn dump(device: &Device, format: &str) -> Result<()> {
    debug!("Dumping {} as {}", device.name, format);
    let text = match format {
        #[cfg(feature = "json")]
        "json" => serde_json::to_string_pretty(device)?,
        #[cfg(feature = "yaml")]
        "yaml" => serde_yaml::to_string(device)?,
        _ => bail!("unknown dump format {format}"),
    };
    println!("{text}");
    Ok(())
}

fn setup_logging(log_level: Option<&str>) {
    // * Log at info by default.
    // * Allow users the option of setting complex logging filters using
    //   env_logger's `RUST_LOG` environment variable.
    // * Override both of those if the logging level is set via the `--log`
    //   command line argument or the config file.
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info");
    let mut builder = env_logger::Builder::from_env(env);
    builder.format_timestamp(None);

    let log_lvl_from_env = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();

    if log_lvl_from_env {
        log::set_max_level(log::LevelFilter::Trace);
    } else {
        let level = match log_level.and_then(|lvl| lvl.parse().ok()) {
            Some(lvl) => lvl,
            None => log::LevelFilter::Info,
        };
        log::set_max_level(level);
        builder.filter_level(level);
    }

    builder.init();
}

fn main() {
    if let Err(ref e) = run() {
        error!("{:?}", e);

        process::exit(1);
    }
}
