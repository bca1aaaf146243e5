//! Command-line interface for xsdcheck

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::process::ExitCode;

#[cfg(feature = "cli")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "cli")]
use xsdcheck::validators::{Particle, TypeContent};
#[cfg(feature = "cli")]
use xsdcheck::{Loader, Location, Schema, SchemaComposer, SchemaSource};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsdcheck")]
#[command(author, version, about = "Structural XML validation against composable XSD schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an XML document against a base schema and its extensions
    Validate {
        /// Path to the base XSD schema
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Extension schema; repeat for several. Defaults to the extension
        /// locations of the document's xsi:schemaLocation
        #[arg(short, long, value_name = "EXTENSION")]
        extension: Vec<PathBuf>,

        /// Path to the XML file to validate
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compose a schema and display its elements and types
    Inspect {
        /// Path to the base XSD schema
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Extension schema; repeat for several
        #[arg(short, long, value_name = "EXTENSION")]
        extension: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xsdcheck=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            schema,
            extension,
            file,
            json,
        } => cmd_validate(schema, extension, file, json),
        Commands::Inspect {
            schema,
            extension,
            json,
        } => cmd_inspect(schema, extension, json).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(feature = "cli")]
fn load_extensions(
    loader: &Loader,
    paths: Vec<PathBuf>,
) -> Result<Vec<SchemaSource>, Box<dyn std::error::Error>> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        sources.push(loader.load_schema(&Location::path(path))?);
    }
    Ok(sources)
}

#[cfg(feature = "cli")]
fn compose(
    loader: &Loader,
    schema_path: PathBuf,
    extensions: Vec<SchemaSource>,
) -> Result<Schema, Box<dyn std::error::Error>> {
    let base = loader.load_schema(&Location::path(schema_path))?;
    let schema = SchemaComposer::new(base)
        .with_extensions(extensions)
        .with_limits(loader.limits().clone())
        .compose()?;
    Ok(schema)
}

#[cfg(feature = "cli")]
fn cmd_validate(
    schema_path: PathBuf,
    extensions: Vec<PathBuf>,
    file: PathBuf,
    json_output: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let loader = Loader::new();
    let document_location = Location::path(&file);
    let doc = loader.load_document(&document_location)?;

    let extensions = if extensions.is_empty() {
        match doc.schema_location_hint()? {
            Some(hint) => loader.load_hinted_extensions(&document_location, &hint)?,
            None => Vec::new(),
        }
    } else {
        load_extensions(&loader, extensions)?
    };

    let schema = compose(&loader, schema_path, extensions)?;
    let result = schema.validate(doc.root());

    if json_output {
        let output = match &result {
            Ok(()) => serde_json::json!({ "valid": true }),
            Err(err) => serde_json::json!({
                "valid": false,
                "message": err.message(),
                "path": err.path_string(),
                "error": err,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match &result {
            Ok(()) => println!("The XML document is valid."),
            Err(err) => println!("The XML document is invalid:\n{}", err),
        }
    }

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[cfg(feature = "cli")]
fn cmd_inspect(
    schema_path: PathBuf,
    extensions: Vec<PathBuf>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loader = Loader::new();
    let extensions = load_extensions(&loader, extensions)?;
    let schema = compose(&loader, schema_path, extensions)?;

    if json_output {
        print_schema_json(&schema)
    } else {
        print_schema_summary(&schema);
        Ok(())
    }
}

/// Extension slot names of a content model, in order
#[cfg(feature = "cli")]
fn extension_slots(content: &TypeContent) -> Vec<String> {
    let mut slots = Vec::new();
    if let TypeContent::Elements(model) = content {
        model.walk(&mut |particle| {
            if let Particle::Wildcard(w) = particle {
                slots.extend(w.slots.keys().map(|name| name.to_string()));
            }
        });
    }
    slots
}

#[cfg(feature = "cli")]
fn type_name(schema: &Schema, type_ref: xsdcheck::validators::TypeRef) -> String {
    schema
        .get_type(type_ref)
        .map(|ty| ty.name.to_string())
        .unwrap_or_else(|| type_ref.to_string())
}

#[cfg(feature = "cli")]
fn print_schema_summary(schema: &Schema) {
    println!("xsdcheck v{}", xsdcheck::VERSION);
    println!();
    println!("Root Element: {}", schema.root_name());
    println!();
    println!("Elements:");
    for element in schema.elements() {
        println!("  {} : {}", element.name, type_name(schema, element.type_ref));
    }
    println!();
    println!("Types:");
    for (type_ref, ty) in schema.types() {
        match &ty.content {
            TypeContent::Simple(constraint) => println!("  {} (simple: {})", ty.name, constraint),
            TypeContent::Elements(_) => {
                let positions = schema
                    .content_model(type_ref)
                    .map(|model| model.position_count())
                    .unwrap_or_default();
                println!("  {} (element content, {} positions)", ty.name, positions);
                let slots = extension_slots(&ty.content);
                if !slots.is_empty() {
                    println!("    extension slots: {}", slots.join(", "));
                }
            }
        }
    }
}

#[cfg(feature = "cli")]
fn print_schema_json(schema: &Schema) -> Result<(), Box<dyn std::error::Error>> {
    use serde_json::{json, Value};

    let elements: Vec<Value> = schema
        .elements()
        .map(|element| {
            json!({
                "name": element.name.to_string(),
                "type": type_name(schema, element.type_ref),
            })
        })
        .collect();

    let types: Vec<Value> = schema
        .types()
        .map(|(_, ty)| match &ty.content {
            TypeContent::Simple(constraint) => json!({
                "name": ty.name.to_string(),
                "kind": "simple",
                "constraint": constraint,
            }),
            TypeContent::Elements(_) => json!({
                "name": ty.name.to_string(),
                "kind": "complex",
                "extensionSlots": extension_slots(&ty.content),
            }),
        })
        .collect();

    let output = json!({
        "root": schema.root_name().to_string(),
        "elements": elements,
        "types": types,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
