use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use docmapper::query::SortDirection;
use docmapper::{
    DialectKind, Page, QueryBuilder, QueryCompiler, Schema, SortKey, TableRef, Value, infer_schema,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "docmapper")]
#[command(about = "Compile document predicates into SQL")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the SQL and parameters for a predicate
    Compile {
        /// Schema description (JSON)
        #[arg(long)]
        schema: PathBuf,
        #[arg(long, value_enum, default_value_t = DialectKind::Sqlite)]
        dialect: DialectKind,
        /// Table name; defaults to the schema's root type
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        table_schema: Option<String>,
        /// Predicate, e.g. `p => p.Author.Username == "admin"`
        #[arg(long = "where")]
        predicate: Option<String>,
        /// Document variable name to strip from field accessors
        #[arg(long)]
        param: Option<String>,
        /// Sort key, `Field` or `Field:desc`; repeatable
        #[arg(long)]
        order_by: Vec<String>,
        #[arg(long)]
        order_by_desc: Vec<String>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long)]
        take: Option<usize>,
        #[arg(long)]
        count: bool,
        /// Value for a `:name` placeholder, `name=value`; repeatable
        #[arg(long)]
        bind: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Infer a schema from sample documents
    Infer {
        #[arg(long)]
        root: String,
        /// JSON file holding one document or an array of documents
        documents: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile {
            schema,
            dialect,
            table,
            table_schema,
            predicate,
            param,
            order_by,
            order_by_desc,
            skip,
            take,
            count,
            bind,
            json,
        } => {
            let schema = load_schema(&schema)?;

            let mut builder = QueryBuilder::new();
            if let Some(param) = param {
                builder = builder.with_parameter(param);
            }
            for binding in &bind {
                let (name, value) = parse_binding(binding)?;
                builder = builder.bind(name, value);
            }

            let query = predicate
                .as_deref()
                .map(|text| builder.build(text))
                .transpose()?;

            let mut sorts = Vec::new();
            for spec in &order_by {
                sorts.push(parse_sort(spec)?);
            }
            for field in order_by_desc {
                sorts.push(SortKey::new(field, SortDirection::Descending)?);
            }

            let mut table = TableRef::new(table.unwrap_or_else(|| schema.root_name().to_string()))?;
            if let Some(qualifier) = table_schema {
                table = table.in_schema(qualifier)?;
            }

            let page = Page { skip, take };
            let dialect = dialect.dialect();
            let compiler = QueryCompiler::new(&schema, dialect.as_ref());
            let compiled = if count {
                compiler.count(&table, query.as_ref())?
            } else {
                compiler.select(&table, query.as_ref(), &sorts, page)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&compiled)?);
            } else {
                println!("{}", compiled.sql);
                for parameter in &compiled.parameters {
                    println!(
                        "-- {} = {}",
                        dialect.placeholder(parameter.index),
                        parameter.value
                    );
                }
            }
            Ok(())
        }
        Command::Infer { root, documents } => {
            let text = fs::read_to_string(&documents)
                .with_context(|| format!("Failed to read '{}'", documents.display()))?;
            let parsed: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("'{}' is not valid JSON", documents.display()))?;
            let samples = match parsed {
                serde_json::Value::Array(items) => items,
                single => vec![single],
            };

            let schema = infer_schema(&root, &samples)?;
            println!("{}", serde_json::to_string_pretty(&schema.to_json()?)?);
            Ok(())
        }
    }
}

fn load_schema(path: &Path) -> Result<Schema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema '{}'", path.display()))?;
    Ok(Schema::from_json(&text)?)
}

fn parse_binding(spec: &str) -> Result<(String, Value)> {
    let (name, raw) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("Binding '{}' must look like name=value", spec))?;
    Ok((name.trim().to_string(), Value::parse_literal(raw.trim())))
}

fn parse_sort(spec: &str) -> Result<SortKey> {
    let (field, direction) = match spec.rsplit_once(':') {
        Some((field, dir)) if dir.eq_ignore_ascii_case("desc") => (field, SortDirection::Descending),
        Some((field, dir)) if dir.eq_ignore_ascii_case("asc") => (field, SortDirection::Ascending),
        Some(_) => return Err(anyhow!("Sort '{}' must be Field, Field:asc or Field:desc", spec)),
        None => (spec, SortDirection::Ascending),
    };
    Ok(SortKey::new(field.trim(), direction)?)
}
