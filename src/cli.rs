//! CLI: describe, check and revive JSON documents against declared record types.
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;

use json_vo::{Decl, Deserializer, Error, Namespace, RecordType, Tagging, Val, scalar};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// check JSON documents against record types declared in a types file, and revive tagged JSON
#[derive(Parser, Debug)]
#[command(name = "json-vo", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the signature of every declared type
    Describe(DescribeOut),
    /// construct every input document as the given type and report every failure
    Check(CheckIn),
    /// revive tagged documents and print them back out
    Revive(ReviveOut),
}

#[derive(Args, Debug, Clone)]
struct TypesSettings {
    /// JSON file declaring the record types: { "Name": { "prop": "string", "$extends": "Base" } }
    #[arg(long, short)]
    types: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    types_settings: TypesSettings,

    /// only describe this type
    #[arg(long)]
    name: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckIn {
    #[command(flatten)]
    types_settings: TypesSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// record type every document must construct as
    #[arg(long = "as")]
    type_name: String,
}

#[derive(clap::Parser, Debug)]
struct ReviveOut {
    #[command(flatten)]
    types_settings: TypesSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// construct untagged top-level documents as this type
    #[arg(long = "as")]
    type_name: Option<String>,

    /// print without `__type__` tags
    #[arg(long, default_value_t = false)]
    plain: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One entry of the types file. Every key not starting with `$` declares a property.
#[derive(Deserialize, Debug)]
struct TypeDeclaration {
    #[serde(rename = "$extends", default)]
    extends: Option<String>,

    /// also accept a bare string as `{ "value": ... }`
    #[serde(rename = "$scalar", default)]
    scalar: bool,

    #[serde(flatten)]
    properties: IndexMap<String, Value>,
}

struct Document {
    source: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypesSettings {
    fn load(&self) -> anyhow::Result<Namespace> {
        let declarations: IndexMap<String, TypeDeclaration> =
            crate::path_de::read_with_path(&self.types)?;
        build_namespace(declarations)
            .with_context(|| format!("invalid types file {}", self.types.display()))
    }
}

impl InputSettings {
    fn load_documents(&self) -> anyhow::Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|error| anyhow!("failed to resolve input file paths: {error}"))?;
        let per_file = source_paths
            .par_iter()
            .map(|path| self.load_file(path))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(per_file.into_iter().flatten().collect())
    }

    fn load_file(&self, path: &Path) -> anyhow::Result<Vec<Document>> {
        let source_path_str = path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file ({source_path_str})"))?;
        let mut documents = Vec::new();
        if self.ndjson {
            for (index, line) in source.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let source = format!("{source_path_str}:{}", index + 1);
                let value = serde_json::from_str::<Value>(line)
                    .with_context(|| format!("Failed to parse JSON line ({source})"))?;
                documents.push(self.select(source, value)?);
            }
        } else {
            let value = serde_json::from_str::<Value>(&source)
                .with_context(|| format!("Failed to parse JSON source file ({source_path_str})"))?;
            documents.push(self.select(source_path_str, value)?);
        }
        Ok(documents)
    }

    fn select(&self, source: String, value: Value) -> anyhow::Result<Document> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Ok(Document { source, value });
        };
        match value.pointer(pointer) {
            Some(selected) => Ok(Document { value: selected.clone(), source }),
            None => bail!("JSON pointer {pointer} matched nothing in {source}"),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Describe(target) => {
                let namespace = target.types_settings.load()?;
                for (name, ty) in namespace.iter() {
                    if target.name.as_deref().is_some_and(|wanted| wanted != name) {
                        continue;
                    }
                    match ty.parent() {
                        Some(parent) => println!(
                            "{} extends {} {}",
                            name.bold(),
                            parent.name(),
                            ty.schema().describe()
                        ),
                        None => println!("{} {}", name.bold(), ty.schema().describe()),
                    }
                }
                Ok(())
            }
            Command::Check(target) => {
                let namespace = target.types_settings.load()?;
                let ty = lookup(&namespace, &target.type_name)?;
                let documents = target.input_settings.load_documents()?;
                let results = documents
                    .par_iter()
                    .map(|document| ty.construct(Val::from(document.value.clone())))
                    .collect::<Vec<_>>();

                let mut failed = 0;
                for (document, result) in documents.iter().zip(results) {
                    match result {
                        Ok(_) => println!("✅ {}", document.source),
                        Err(error) => {
                            failed += 1;
                            println!("❌ {}", document.source.red());
                            for line in failure_lines(&error) {
                                println!("   {line}");
                            }
                        }
                    }
                }
                let total = documents.len();
                tracing::info!(total, failed, "checked documents");
                if failed > 0 {
                    bail!("{failed} of {total} documents failed to construct as {}", target.type_name);
                }
                eprintln!("{}", format!("{total} documents are valid {}", target.type_name).green());
                Ok(())
            }
            Command::Revive(target) => {
                let namespace = target.types_settings.load()?;
                let deserializer = Deserializer::for_namespaces([Some(&namespace)])?;
                let fallback = target
                    .type_name
                    .as_deref()
                    .map(|name| lookup(&namespace, name))
                    .transpose()?;
                let tagging = if target.plain { Tagging::Plain } else { Tagging::Tagged };

                let mut rendered = Vec::new();
                for document in target.input_settings.load_documents()? {
                    let revived = deserializer
                        .revive(document.value)
                        .with_context(|| format!("failed to revive {}", document.source))?;
                    let revived = match (revived, fallback) {
                        (Val::Record(record), _) => Val::Record(record),
                        (other, Some(ty)) => Val::Record(
                            ty.construct(other)
                                .with_context(|| format!("failed to construct {}", document.source))?,
                        ),
                        (other, None) => other,
                    };
                    let json = revived.to_json(tagging);
                    rendered.push(if target.input_settings.ndjson {
                        serde_json::to_string(&json)?
                    } else {
                        serde_json::to_string_pretty(&json)?
                    });
                }

                let output = rendered.join("\n");
                match target.out.as_ref() {
                    Some(out) => {
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::write(out, output)?;
                    }
                    None => println!("{output}"),
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Define types in file order; a type may only reference or extend types declared before it.
fn build_namespace(declarations: IndexMap<String, TypeDeclaration>) -> anyhow::Result<Namespace> {
    let mut namespace = Namespace::new();
    for (name, declaration) in declarations {
        let properties = declaration
            .properties
            .iter()
            .map(|(property, decl)| (property.clone(), Decl::from_json(decl, &namespace)))
            .collect::<Vec<_>>();
        let builder = match (&declaration.extends, declaration.scalar) {
            (Some(base), true) => bail!("{name} cannot be a $scalar and also $extends {base}"),
            (Some(base), false) => namespace
                .get(base)
                .ok_or_else(|| anyhow!("{name} extends {base}, which is not declared before it"))?
                .extend(&name),
            (None, true) => scalar::builder(&name),
            (None, false) => RecordType::builder(&name),
        };
        let ty = builder
            .properties(properties)
            .build()
            .with_context(|| format!("type {name}"))?;
        namespace.insert(ty);
    }
    Ok(namespace)
}

fn lookup<'a>(namespace: &'a Namespace, name: &str) -> anyhow::Result<&'a RecordType> {
    namespace
        .get(name)
        .ok_or_else(|| anyhow!("type {name} is not declared in the types file"))
}

fn failure_lines(error: &Error) -> Vec<String> {
    match error.construction() {
        Some(construction) => construction.paths(),
        None => vec![error.to_string()],
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern)? {
            out.push(entry?);
        }
        if out.len() == before {
            return Err(format!("glob pattern matched no files: {pattern}").into());
        }
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn namespace(types: Value) -> anyhow::Result<Namespace> {
        let declarations: IndexMap<String, TypeDeclaration> =
            crate::path_de::from_str_with_path(&types.to_string()).map_err(|e| anyhow!(e))?;
        build_namespace(declarations)
    }

    #[test]
    fn builds_types_in_declaration_order() {
        let types = namespace(json!({
            "Currency": {"$scalar": true},
            "Money": {"amount": "number", "currency": "Currency"},
            "Priced": {"$extends": "Money", "label": "string?", "tags": ["string"]}
        }))
        .unwrap();
        let priced = types.get("Priced").unwrap();
        assert_eq!(priced.parent().map(RecordType::name), Some("Money"));
        assert_eq!(
            priced.schema().describe(),
            "{ amount:number, currency:Currency, label:string?, tags:[string] }"
        );
        let record = priced
            .construct(json!({"amount": 1, "currency": "GBP", "tags": []}))
            .unwrap();
        assert_eq!(
            record.to_json(),
            json!({"__type__": "Priced", "amount": 1, "currency": {"__type__": "Currency", "value": "GBP"}, "tags": []})
        );
    }

    #[test]
    fn rejects_forward_references() {
        let error = namespace(json!({"Sub": {"$extends": "Base"}, "Base": {}})).unwrap_err();
        assert_eq!(error.to_string(), "Sub extends Base, which is not declared before it");
        let error = namespace(json!({"Holder": {"item": "Later"}})).unwrap_err();
        assert_eq!(
            format!("{error:#}"),
            "type Holder: Property defined as unsupported type (\"Later\")"
        );
    }

    #[test]
    fn scalars_cannot_extend() {
        let error =
            namespace(json!({"Base": {}, "Code": {"$extends": "Base", "$scalar": true}})).unwrap_err();
        assert_eq!(error.to_string(), "Code cannot be a $scalar and also $extends Base");
        assert!(namespace(json!({"Code": {"$scalar": true}})).is_ok());
    }

    #[test]
    fn parses_subcommands() {
        let cli = CommandLineInterface::try_parse_from([
            "json-vo", "check", "--types", "types.json", "--as", "Money", "--ndjson", "-i", "a.ndjson", "b.ndjson",
        ])
        .unwrap();
        let Command::Check(check) = cli.cmd else { panic!("expected check") };
        assert_eq!(check.type_name, "Money");
        assert!(check.input_settings.ndjson);
        assert_eq!(check.input_settings.input, vec!["a.ndjson", "b.ndjson"]);
    }

    #[test]
    fn json_pointer_selects_a_subnode() {
        let settings = InputSettings { ndjson: false, json_pointer: Some("/data/0".into()), input: vec![] };
        let document = settings.select("doc".into(), json!({"data": [{"a": 1}]})).unwrap();
        assert_eq!(document.value, json!({"a": 1}));
        assert!(settings.select("doc".into(), json!({})).is_err());
    }
}
