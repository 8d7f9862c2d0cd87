//! # CLI Integration Tests
//!
//! Argument parsing of every subcommand and the hand-off of the parsed values to the
//! job configuration.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use clap::Parser;
    use std::path::PathBuf;

    use crate::cli::{Cli, Commands, ReportFormat};
    use crate::input::Operation;
    use crate::output::OutputFormat;

    /// `--help` exits early through an "error"
    #[test]
    fn test_cli_help() {
        let result = Cli::try_parse_from(["gridslice", "--help"]);
        let error = result.unwrap_err();
        assert!(error.to_string().contains("Subset and regrid gridded NetCDF datasets"));
    }

    #[test]
    fn test_cli_version() {
        assert!(Cli::try_parse_from(["gridslice", "--version"]).is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "gridslice",
            "--verbose",
            "--config",
            "/path/to/job.yaml",
            "info",
            "/data/sst",
        ]);

        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/job.yaml")));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["gridslice", "-v", "-q", "info", "/data"]).is_err());
    }

    #[test]
    fn test_subset_command() {
        let cli = Cli::parse_from([
            "gridslice",
            "subset",
            "--variables",
            "sst,ice",
            "--in-path",
            "/data/sst",
            "--out-path",
            "/data/out",
            "--lon-min",
            "170",
            "--lon-max",
            "-170",
            "--lat-min",
            "-10.5",
            "--lat-max",
            "10",
            "--start-year",
            "2022",
            "--start-month",
            "1",
            "--start-day",
            "1",
            "--end-year",
            "2022",
            "--end-month",
            "1",
            "--end-day",
            "10",
            "--output-format",
            "csv",
        ]);

        let Commands::Subset {
            selection,
            output_format,
        } = &cli.command
        else {
            panic!("Expected Subset command");
        };
        assert_eq!(selection.variables, vec!["sst,ice".to_string()]);
        assert_eq!(selection.lon_max, Some(-170.0));
        assert_eq!(selection.lat_min, Some(-10.5));
        assert_eq!(*output_format, Some(OutputFormat::Csv));
        assert!(!selection.dry_run);

        let (operation, config) = cli.command.job_overrides().unwrap();
        assert_eq!(operation, Operation::Subset);
        let job = config.into_job(operation).unwrap();
        assert_eq!(job.window.variables, vec!["sst".to_string(), "ice".to_string()]);
        assert_eq!(job.window.bbox.lon_min, 170.0);
        assert_eq!(job.format, OutputFormat::Csv);
        assert!(job.target.is_none());
    }

    #[test]
    fn test_subset_variables_repeated() {
        let cli = Cli::parse_from([
            "gridslice",
            "subset",
            "--variables",
            "sst",
            "ice",
            "--dry-run",
        ]);
        assert!(cli.command.is_dry_run());
        let (_, config) = cli.command.job_overrides().unwrap();
        assert_eq!(config.variables, vec!["sst".to_string(), "ice".to_string()]);
    }

    #[test]
    fn test_subset_rejects_unknown_output_format() {
        let result = Cli::try_parse_from(["gridslice", "subset", "--output-format", "hdf4"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_subset_geotiff_output_format() {
        let cli = Cli::parse_from(["gridslice", "subset", "--output-format", "tif"]);
        let Commands::Subset { output_format, .. } = &cli.command else {
            panic!("Expected Subset command");
        };
        assert_eq!(*output_format, Some(OutputFormat::Geotiff));
    }

    #[test]
    fn test_regrid_command() {
        let cli = Cli::parse_from([
            "gridslice",
            "regrid",
            "--variables",
            "sst",
            "--temporal-resolution",
            "pentad",
            "--spatial-resolution",
            "0.25",
        ]);

        let Commands::Regrid {
            temporal_resolution,
            spatial_resolution,
            ..
        } = &cli.command
        else {
            panic!("Expected Regrid command");
        };
        assert_eq!(temporal_resolution.as_deref(), Some("pentad"));
        assert_eq!(*spatial_resolution, Some(0.25));

        let (operation, config) = cli.command.job_overrides().unwrap();
        assert_eq!(operation, Operation::Regrid);
        assert_eq!(config.operation, Some(Operation::Regrid));
        assert_eq!(config.spatial_resolution, Some(0.25));
    }

    #[test]
    fn test_regrid_time_series_flag() {
        let cli = Cli::parse_from([
            "gridslice",
            "regrid",
            "--variables",
            "sst",
            "--temporal-resolution",
            "7d",
            "--time-series",
        ]);
        let Commands::Regrid { time_series, .. } = &cli.command else {
            panic!("Expected Regrid command");
        };
        assert!(*time_series);

        let (_, config) = cli.command.job_overrides().unwrap();
        assert_eq!(config.time_series, Some(true));
        assert_eq!(config.temporal_resolution.as_deref(), Some("7d"));

        let cli = Cli::parse_from(["gridslice", "regrid", "--variables", "sst"]);
        let (_, config) = cli.command.job_overrides().unwrap();
        assert_eq!(config.time_series, None);
    }

    #[test]
    fn test_regrid_has_no_output_format() {
        let result = Cli::try_parse_from(["gridslice", "regrid", "--output-format", "csv"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_regrid_rejects_bad_temporal_resolution() {
        let result = Cli::try_parse_from(["gridslice", "regrid", "--temporal-resolution", "hourly"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_info_command() {
        let cli = Cli::parse_from([
            "gridslice",
            "info",
            "/data/{YEAR}{MONTH}{DAY}.nc",
            "--start-date",
            "2022-01-01",
            "--end-date",
            "2022-01-31",
            "--detailed",
            "--format",
            "json",
        ]);

        let Commands::Info {
            in_path,
            start_date,
            end_date,
            detailed,
            format,
        } = &cli.command
        else {
            panic!("Expected Info command");
        };
        assert_eq!(in_path, "/data/{YEAR}{MONTH}{DAY}.nc");
        assert_eq!(*start_date, NaiveDate::from_ymd_opt(2022, 1, 1));
        assert_eq!(*end_date, NaiveDate::from_ymd_opt(2022, 1, 31));
        assert!(*detailed);
        assert_eq!(*format, ReportFormat::Json);
        assert!(cli.command.job_overrides().is_none());
    }

    #[test]
    fn test_info_dates_come_in_pairs() {
        let result = Cli::try_parse_from(["gridslice", "info", "/data", "--start-date", "2022-01-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["gridslice", "validate", "job.yaml", "--operation", "regrid"]);
        let Commands::Validate {
            config_file,
            operation,
        } = &cli.command
        else {
            panic!("Expected Validate command");
        };
        assert_eq!(config_file, &Some(PathBuf::from("job.yaml")));
        assert_eq!(*operation, Some(Operation::Regrid));
    }

    #[test]
    fn test_completions_command() {
        let cli = Cli::parse_from(["gridslice", "completions", "zsh", "-o", "_gridslice"]);
        let Commands::Completions { shell, output } = &cli.command else {
            panic!("Expected Completions command");
        };
        assert_eq!(*shell, clap_complete::Shell::Zsh);
        assert_eq!(output, &Some(PathBuf::from("_gridslice")));
    }
}
