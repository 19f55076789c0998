//! Compiled contract artifacts.
//!
//! Artifacts are the JSON files emitted by a Hardhat compilation, laid out as
//! `<artifacts>/<source path>/<ContractName>.json`.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use anyhow::{Context, Result};
use serde::Deserialize;

/// Directory produced by the compiler that never contains contract artifacts.
const BUILD_INFO_DIR: &str = "build-info";

/// Library placeholders left in the bytecode, keyed by source then library name.
pub type LinkReferences = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// A compiled contract artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// The contract name.
    pub contract_name: String,
    /// The source file the contract was compiled from.
    #[serde(default)]
    pub source_name: String,
    /// The contract ABI.
    pub abi: JsonAbi,
    /// Hex-encoded creation bytecode. Kept as a string since unlinked
    /// bytecode contains non-hex placeholders.
    pub bytecode: String,
    #[serde(default)]
    pub link_references: LinkReferences,
}

impl ContractArtifact {
    /// Load an artifact from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read artifact from {}", path.display()))?;
        let artifact: Self = serde_json::from_str(&content)
            .context(format!("Failed to parse artifact {}", path.display()))?;
        Ok(artifact)
    }

    /// The fully qualified name, `<source>:<contract>`.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Decode the creation bytecode.
    ///
    /// Fails for interfaces and abstract contracts (empty bytecode) and for
    /// contracts whose libraries have not been linked.
    pub fn creation_code(&self) -> Result<Vec<u8>> {
        if !self.link_references.is_empty() {
            let libraries = self
                .link_references
                .iter()
                .flat_map(|(source, libs)| libs.keys().map(move |lib| format!("{source}:{lib}")))
                .collect::<Vec<_>>();
            anyhow::bail!(
                "Contract {} needs libraries to be linked before deployment: {}",
                self.contract_name,
                libraries.join(", ")
            );
        }

        let code = hex::decode(self.bytecode.trim_start_matches("0x")).context(format!(
            "Invalid bytecode in artifact for {}",
            self.contract_name
        ))?;

        if code.is_empty() {
            anyhow::bail!(
                "Contract {} is abstract or an interface and cannot be deployed",
                self.contract_name
            );
        }

        Ok(code)
    }

    /// Build the deployment payload: the creation bytecode followed by the
    /// ABI-encoded constructor arguments.
    ///
    /// Arguments are given in their textual form (`"42"`, `"0xabc..."`,
    /// `"[1,2]"`) and coerced to the constructor's declared input types.
    pub fn deploy_code(&self, args: &[String]) -> Result<Bytes> {
        let mut code = self.creation_code()?;

        let expected = self
            .abi
            .constructor
            .as_ref()
            .map(|ctor| ctor.inputs.len())
            .unwrap_or_default();

        if expected != args.len() {
            anyhow::bail!(
                "Contract {} expects {} constructor arguments, got {}",
                self.contract_name,
                expected,
                args.len()
            );
        }

        if let Some(ctor) = &self.abi.constructor {
            let values = ctor
                .inputs
                .iter()
                .zip(args)
                .map(|(param, arg)| {
                    let ty = param
                        .resolve()
                        .context(format!("Unsupported constructor parameter type {}", param.ty))?;
                    ty.coerce_str(arg).context(format!(
                        "Failed to parse constructor argument {} = {:?} as {}",
                        param.name, arg, param.ty
                    ))
                })
                .collect::<Result<Vec<DynSolValue>>>()?;

            let encoded = ctor
                .abi_encode_input(&values)
                .context("Failed to encode constructor arguments")?;
            code.extend(encoded);
        }

        Ok(code.into())
    }
}

/// Resolves contract names to artifacts stored under a directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the artifact file for a contract.
    ///
    /// Accepts either a bare contract name, which must be unique across all
    /// sources, or a fully qualified `contracts/File.sol:Name`.
    pub fn find(&self, name: &str) -> Result<PathBuf> {
        if !self.root.is_dir() {
            anyhow::bail!(
                "Artifacts directory not found: {}. Compile the contracts first.",
                self.root.display()
            );
        }

        if let Some((source, contract)) = name.rsplit_once(':') {
            let path = self.root.join(source).join(format!("{contract}.json"));
            if !path.is_file() {
                anyhow::bail!("Artifact for contract {} not found at {}", name, path.display());
            }
            return Ok(path);
        }

        let file_name = format!("{name}.json");
        let mut matches = Vec::new();
        collect_artifacts(&self.root, &file_name, &mut matches)?;

        match matches.len() {
            0 => anyhow::bail!(
                "Artifact for contract {} not found in {}",
                name,
                self.root.display()
            ),
            1 => Ok(matches.remove(0)),
            _ => {
                let candidates = matches
                    .iter()
                    .filter_map(|path| self.qualified_name_of(path))
                    .collect::<Vec<_>>();
                anyhow::bail!(
                    "Multiple artifacts for contract {} found, use a fully qualified name: {}",
                    name,
                    candidates.join(", ")
                )
            }
        }
    }

    /// Find and load the artifact for a contract.
    pub fn load(&self, name: &str) -> Result<ContractArtifact> {
        let path = self.find(name)?;
        tracing::debug!(contract = %name, path = %path.display(), "Loading contract artifact");
        ContractArtifact::load_from_file(&path)
    }

    fn qualified_name_of(&self, path: &Path) -> Option<String> {
        let source = path.parent()?.strip_prefix(&self.root).ok()?;
        let contract = path.file_stem()?.to_string_lossy();
        Some(format!("{}:{}", source.display(), contract))
    }
}

fn collect_artifacts(dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .context(format!("Failed to read artifacts directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry.context("Failed to read artifacts directory entry")?;
        let path = entry.path();

        if path.is_dir() {
            if entry.file_name() == BUILD_INFO_DIR {
                continue;
            }
            collect_artifacts(&path, file_name, out)?;
        } else if entry.file_name() == file_name {
            out.push(path);
        }
    }

    Ok(())
}
