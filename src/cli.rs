use super::pipeline::GrapherConfig;
use super::window::parse_time_of_day;
use super::{GrapherError, Result, DEFAULT_TIMEZONE, VERSION};
use chrono_tz::Tz;
use clap::{App, Arg, ArgMatches};
use std::path::PathBuf;

/// Describes the CLI arguments that control the plotting of the exported series.
pub fn app() -> App<'static, 'static> {
    let arg_csvin = Arg::with_name("csv_file")
        .help("the csv file with the influx data to load")
        .index(1)
        .required(true);
    let arg_highlights = Arg::with_name("highlights")
        .help("hour (format HH:MM) to be highlighted in the graphs, can be repeated")
        .short("t")
        .long("highlights")
        .takes_value(true)
        .multiple(true)
        .number_of_values(1);
    let arg_title = Arg::with_name("title")
        .help("display the main title in the graph")
        .long("title");
    let arg_min = Arg::with_name("min")
        .help("minimum hour (format HH:MM) to start the graphs")
        .long("min")
        .takes_value(true);
    let arg_max = Arg::with_name("max")
        .help("maximum hour (format HH:MM) to end the graphs")
        .long("max")
        .takes_value(true);
    let arg_outdir = Arg::with_name("outdir")
        .help("path to the folder where the produced graphs are stored")
        .short("o")
        .long("outdir")
        .takes_value(true)
        .default_value(".");
    let arg_dry_run = Arg::with_name("dry_run")
        .help("perform a dry run reporting the graphs without storing anything")
        .long("dry-run");
    let arg_timezone = Arg::with_name("timezone")
        .help("reference timezone the data times are converted to")
        .long("timezone")
        .takes_value(true)
        .default_value(DEFAULT_TIMEZONE);
    let arg_skip_lines = Arg::with_name("skip_lines")
        .help("number of lines discarded between a comment line and the csv header")
        .long_help(
            "number of lines discarded between a comment line and the csv header; \
            use 2 for annotated exports with #group, #datatype and #default rows",
        )
        .long("skip-lines")
        .takes_value(true)
        .default_value("1");
    let arg_verbose = Arg::with_name("verbose")
        .help("print verbose information")
        .short("v")
        .long("verbose");
    App::new("influx_grapher")
        .version(VERSION.unwrap_or("unknown"))
        .about("create plots from the csv data exported from InfluxDB")
        .arg(arg_csvin)
        .arg(arg_highlights)
        .arg(arg_title)
        .arg(arg_min)
        .arg(arg_max)
        .arg(arg_outdir)
        .arg(arg_dry_run)
        .arg(arg_timezone)
        .arg(arg_skip_lines)
        .arg(arg_verbose)
}

/// Validates the matched arguments into the run configuration.
pub fn config_from_matches(cli_args: &ArgMatches<'_>) -> Result<GrapherConfig> {
    let csvin = PathBuf::from(cli_args.value_of("csv_file").unwrap_or_default());
    let mut config = GrapherConfig::new(csvin);
    if let Some(values) = cli_args.values_of("highlights") {
        config.highlights = values.map(parse_time_of_day).collect::<Result<Vec<_>>>()?;
    }
    config.min = cli_args.value_of("min").map(parse_time_of_day).transpose()?;
    config.max = cli_args.value_of("max").map(parse_time_of_day).transpose()?;
    config.title = cli_args.is_present("title");
    config.outdir = PathBuf::from(cli_args.value_of("outdir").unwrap_or("."));
    config.dry_run = cli_args.is_present("dry_run");
    config.timezone = parse_timezone(cli_args.value_of("timezone").unwrap_or(DEFAULT_TIMEZONE))?;
    let skip_lines = cli_args.value_of("skip_lines").unwrap_or("1");
    config.skip_lines = skip_lines
        .parse::<usize>()
        .map_err(|_| GrapherError::InvalidArgument {
            name: "--skip-lines",
            value: skip_lines.to_string(),
        })?;
    config.verbose = cli_args.is_present("verbose");
    Ok(config)
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| GrapherError::InvalidTimezone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn config(args: &[&str]) -> Result<GrapherConfig> {
        let mut argv = vec!["influx_grapher"];
        argv.extend_from_slice(args);
        config_from_matches(&app().get_matches_from(argv))
    }

    #[test]
    fn test_defaults() {
        let c = config(&["export.csv"]).unwrap();
        assert_eq!(c.csv_file, PathBuf::from("export.csv"));
        assert!(c.highlights.is_empty());
        assert_eq!(c.min, None);
        assert_eq!(c.max, None);
        assert!(!c.title);
        assert_eq!(c.outdir, PathBuf::from("."));
        assert!(!c.dry_run);
        assert_eq!(c.timezone, Tz::Europe__Rome);
        assert_eq!(c.skip_lines, 1);
        assert!(!c.verbose);
    }

    #[test]
    fn test_all_arguments() {
        let c = config(&[
            "export.csv",
            "-t",
            "12:00",
            "--highlights",
            "08:30",
            "-t",
            "18:15",
            "--min",
            "07:00",
            "--max",
            "20:00",
            "--title",
            "-o",
            "charts",
            "--dry-run",
            "--timezone",
            "UTC",
            "--skip-lines",
            "2",
            "-v",
        ])
        .unwrap();
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(c.highlights, vec![hm(12, 0), hm(8, 30), hm(18, 15)]);
        assert_eq!(c.min, Some(hm(7, 0)));
        assert_eq!(c.max, Some(hm(20, 0)));
        assert!(c.title);
        assert_eq!(c.outdir, PathBuf::from("charts"));
        assert!(c.dry_run);
        assert_eq!(c.timezone, Tz::UTC);
        assert_eq!(c.skip_lines, 2);
        assert!(c.verbose);
    }

    #[test]
    fn test_invalid_values() {
        match config(&["export.csv", "-t", "noon"]) {
            Err(GrapherError::InvalidTimeOfDay(s)) => assert_eq!(s, "noon"),
            other => panic!("unexpected result {:?}", other),
        }
        match config(&["export.csv", "--max", "24:10"]) {
            Err(GrapherError::InvalidTimeOfDay(s)) => assert_eq!(s, "24:10"),
            other => panic!("unexpected result {:?}", other),
        }
        match config(&["export.csv", "--timezone", "Mars/Olympus"]) {
            Err(GrapherError::InvalidTimezone(s)) => assert_eq!(s, "Mars/Olympus"),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(config(&["export.csv", "--skip-lines", "two"]).is_err());
    }
}
