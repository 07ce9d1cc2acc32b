use schemabridge::dbml::{generate_dbml, parse_dbml};
use schemabridge::logging::{LogFormat, init_logging};
use schemabridge::model::{DiagramSchema, Diagnostic};
use schemabridge::sql::{Dialect, generate_sql, parse_sql};
use schemabridge::validate::load_diagram_schema;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Sql,
    Dbml,
    Json,
}

impl Format {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sql" | "ddl" => Some(Self::Sql),
            "dbml" => Some(Self::Dbml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_str(ext).unwrap_or(Self::Sql),
            None => Self::Sql,
        }
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <input|-> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -f, --from <fmt>          Input format: sql, dbml, json (default: by extension)");
    eprintln!("  -t, --to <fmt>            Output format: sql, dbml, json (default: dbml)");
    eprintln!("  -d, --dialect <name>      Input dialect: postgresql, mysql, sqlite, auto (default: auto)");
    eprintln!("      --target-dialect <name>  Output dialect (default: input dialect)");
    eprintln!("  -o, --output <file>       Output file (default: stdout)");
    eprintln!("      --strict              Fail if the parser reported any diagnostics");
    eprintln!("      --log-level <filter>  Log filter (default: $SCHEMABRIDGE_LOG, $RUST_LOG, warn)");
    eprintln!(
        "      --log-format <fmt>    Log format: {} (default: {})",
        LogFormat::variants().join(", "),
        LogFormat::default()
    );
    process::exit(1);
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn value(args: &[String], i: &mut usize) -> String {
    *i += 1;
    match args.get(*i) {
        Some(v) => v.clone(),
        None => fail(format!("Missing value for {}", args[*i - 1])),
    }
}

fn parse_dialect(name: &str) -> Option<Dialect> {
    if name.eq_ignore_ascii_case("auto") {
        return None;
    }
    Some(name.parse().unwrap_or_else(|e| fail(e)))
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "-h" || args[1] == "--help" {
        usage(&args[0]);
    }

    let input_path = &args[1];
    let mut from: Option<Format> = None;
    let mut to = Format::Dbml;
    let mut dialect: Option<Dialect> = None;
    let mut target_dialect: Option<Dialect> = None;
    let mut output_path: Option<String> = None;
    let mut strict = false;
    let mut log_level: Option<String> = None;
    let mut log_format = LogFormat::default();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-f" | "--from" => {
                let v = value(&args, &mut i);
                let format = Format::from_str(&v)
                    .unwrap_or_else(|| fail(format!("Invalid input format: {}", v)));
                from = Some(format);
            }
            "-t" | "--to" => {
                let v = value(&args, &mut i);
                to = Format::from_str(&v)
                    .unwrap_or_else(|| fail(format!("Invalid output format: {}", v)));
            }
            "-d" | "--dialect" => dialect = parse_dialect(&value(&args, &mut i)),
            "--target-dialect" => target_dialect = parse_dialect(&value(&args, &mut i)),
            "-o" | "--output" => output_path = Some(value(&args, &mut i)),
            "--strict" => strict = true,
            "--log-level" => log_level = Some(value(&args, &mut i)),
            "--log-format" => {
                log_format = value(&args, &mut i).parse().unwrap_or_else(|e| fail(e));
            }
            "-h" | "--help" => usage(&args[0]),
            _ => fail(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    if let Err(e) = init_logging(log_level.as_deref(), log_format) {
        fail(e);
    }

    let input = if input_path == "-" {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            fail(format!("Failed to read stdin: {}", e));
        }
        buf
    } else {
        fs::read_to_string(input_path)
            .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", input_path, e)))
    };

    let from = from.unwrap_or_else(|| Format::from_path(input_path));
    let source_dialect = dialect.unwrap_or_else(|| Dialect::detect(&input));

    let (schema, diagnostics): (DiagramSchema, Vec<Diagnostic>) = match from {
        Format::Sql => {
            info!(dialect = %source_dialect, "parsing SQL");
            let out = parse_sql(&input, source_dialect);
            let errors = out.errors.clone();
            (out.into_schema(), errors)
        }
        Format::Dbml => {
            let out = parse_dbml(&input);
            let errors = out.errors.clone();
            (out.into_schema(), errors)
        }
        Format::Json => match load_diagram_schema(&input) {
            Ok(schema) => (schema, Vec::new()),
            Err(e) => fail(format!("Invalid diagram: {}", e)),
        },
    };

    for diagnostic in &diagnostics {
        eprintln!("{}: {}", input_path, diagnostic);
    }
    if strict && !diagnostics.is_empty() {
        fail(format!("{} diagnostic(s) reported", diagnostics.len()));
    }

    let rendered = match to {
        Format::Sql => generate_sql(&schema, target_dialect.unwrap_or(source_dialect)),
        Format::Dbml => generate_dbml(&schema),
        Format::Json => match serde_json::to_string_pretty(&schema) {
            Ok(mut json) => {
                json.push('\n');
                json
            }
            Err(e) => fail(format!("Failed to encode diagram: {}", e)),
        },
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &rendered) {
                fail(format!("Failed to write {}: {}", path, e));
            }
        }
        None => print!("{}", rendered),
    }
}
