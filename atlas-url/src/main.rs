use clap::Parser;
use std::path::PathBuf;

use atlas_url::payload::PAYLOAD_TYPE;

/// Generate and inspect shareable URL state for the cell-atlas explorer
#[derive(Parser)]
#[clap(author, version, about)]
enum Cli {
    /// Parse and validate a schema, reporting any problems
    Check {
        /// Path to the schema to check
        #[clap(long = "schema", name = "SCHEMA_FILE")]
        schema_file: PathOrStdin,
    },
    /// Encode a JSON value as a URL token, printing the token to stdout
    #[clap(after_help = ENCODE_COMMAND_AFTER_HELP)]
    Encode {
        /// Path to a schema to use instead of the bundled explorer schema
        #[clap(long = "schema", name = "SCHEMA_FILE", display_order = 0)]
        schema_file: Option<PathOrStdin>,
        /// Type of the value to encode
        #[clap(long = "type", name = "TYPE", default_value = PAYLOAD_TYPE, display_order = 1)]
        type_name: String,
        /// Path to the JSON value to encode
        #[clap(name = "JSON_FILE")]
        json_file: PathOrStdin,
    },
    /// Decode a URL token, printing the value to stdout as JSON
    Decode {
        /// Path to a schema to use instead of the bundled explorer schema
        #[clap(long = "schema", name = "SCHEMA_FILE", display_order = 0)]
        schema_file: Option<PathOrStdin>,
        /// Type of the encoded value
        #[clap(long = "type", name = "TYPE", default_value = PAYLOAD_TYPE, display_order = 1)]
        type_name: String,
        /// The URL token to decode
        #[clap(name = "TOKEN")]
        token: String,
    },
    /// Write a table of URL tokens for the annotations of a taxonomy dendrogram
    Annotations {
        /// Path to the dendrogram JSON
        #[clap(name = "DENDROGRAM_FILE")]
        dendrogram_file: PathOrStdin,
        /// Path to write the table to
        #[clap(name = "OUTPUT_FILE")]
        output_file: PathBuf,
    },
    /// Write a table of URL tokens for the marker gene sets of a TSV table
    #[clap(after_help = GENES_COMMAND_AFTER_HELP)]
    Genes {
        /// Path to the tab-separated gene table
        #[clap(name = "GENES_FILE")]
        genes_file: PathOrStdin,
        /// Path to write the table to
        #[clap(name = "OUTPUT_FILE")]
        output_file: PathBuf,
    },
}

const ENCODE_COMMAND_AFTER_HELP: &str = "\
Examples:

  $ atlas-url encode payload.json
  $ echo '{ \"symbol\": \"Gfap\" }' | atlas-url encode --type Gene -
  $ atlas-url encode --schema custom.kiwi --type Camera camera.json
";

const GENES_COMMAND_AFTER_HELP: &str = "\
The table must have a header line naming the columns `Cell_label`, `Labelset`,
`Markers_label` (comma-separated gene symbols) and `defined_class` (the key of
each row in the output table).
";

#[derive(Clone, Debug)]
enum PathOrStdin {
    StdIn,
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(src: &str) -> Result<PathOrStdin, std::convert::Infallible> {
        match src {
            "-" => Ok(PathOrStdin::StdIn),
            _ => Ok(PathOrStdin::Path(PathBuf::from(src))),
        }
    }
}

fn unwrap_or_exit<T>(option: Option<T>) -> T {
    option.unwrap_or_else(|| std::process::exit(atlas_url::Status::Error.exit_code()))
}

fn load_file_or_exit(driver: &mut atlas_url::Driver, file: PathOrStdin) -> atlas_url::source::FileId {
    unwrap_or_exit(match file {
        PathOrStdin::StdIn => driver.load_source("<stdin>".to_owned(), std::io::stdin()),
        PathOrStdin::Path(path) => driver.load_source_path(&path),
    })
}

fn load_schema_or_exit(
    driver: &mut atlas_url::Driver,
    file: Option<PathOrStdin>,
) -> atlas_url::source::FileId {
    match file {
        Some(file) => load_file_or_exit(driver, file),
        None => driver.load_bundled_schema(),
    }
}

fn main() -> ! {
    let mut driver = atlas_url::Driver::new();
    driver.install_panic_hook();

    let status = match Cli::parse() {
        Cli::Check { schema_file } => {
            let file_id = load_file_or_exit(&mut driver, schema_file);
            driver.check_schema(file_id)
        }
        Cli::Encode {
            schema_file,
            type_name,
            json_file,
        } => {
            let schema_file_id = load_schema_or_exit(&mut driver, schema_file);
            let json_file_id = load_file_or_exit(&mut driver, json_file);
            driver.encode_and_emit(schema_file_id, &type_name, json_file_id)
        }
        Cli::Decode {
            schema_file,
            type_name,
            token,
        } => {
            let schema_file_id = load_schema_or_exit(&mut driver, schema_file);
            driver.decode_and_emit(schema_file_id, &type_name, &token)
        }
        Cli::Annotations {
            dendrogram_file,
            output_file,
        } => {
            let file_id = load_file_or_exit(&mut driver, dendrogram_file);
            driver.write_annotation_table(file_id, &output_file)
        }
        Cli::Genes {
            genes_file,
            output_file,
        } => {
            let file_id = load_file_or_exit(&mut driver, genes_file);
            driver.write_gene_table(file_id, &output_file)
        }
    };

    std::process::exit(status.exit_code());
}
