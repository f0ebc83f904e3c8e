// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `prism-inspect <shader.wgsl> [--settings file.ron]`
//!
//! Prints the reflection of a WGSL program as RON, then the commands a commit of a
//! freshly created binding table records on the headless device.

use anyhow::{bail, Context, Result};
use prism_core::renderer::{
    BindingSettings, BufferReflection, BufferType, Program, ProgramReflection, ProgramVars,
    Resource, Variable,
};
use prism_infra::{HeadlessDevice, RecordingCommandList, WgslModule};
use ron::ser::PrettyConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Serialize)]
struct ReflectionDump<'a> {
    program: &'a str,
    vertex_inputs: &'a BTreeMap<String, Variable>,
    fragment_outputs: &'a BTreeMap<String, Variable>,
    constant_buffers: Vec<&'a BufferReflection>,
    structured_buffers: Vec<&'a BufferReflection>,
    resources: &'a BTreeMap<String, Resource>,
}

impl<'a> ReflectionDump<'a> {
    fn new(reflection: &'a ProgramReflection) -> Self {
        let buffers = |ty| {
            reflection
                .buffer_map(ty)
                .values()
                .map(|buffer| &**buffer)
                .collect()
        };
        Self {
            program: reflection.label(),
            vertex_inputs: reflection.vertex_inputs(),
            fragment_outputs: reflection.fragment_outputs(),
            constant_buffers: buffers(BufferType::Constant),
            structured_buffers: buffers(BufferType::Structured),
            resources: reflection.resources(),
        }
    }
}

struct Args {
    shader: PathBuf,
    settings: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut shader = None;
    let mut settings = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                let path = args.next().context("--settings expects a file path")?;
                settings = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {flag}"),
            path if shader.is_none() => shader = Some(PathBuf::from(path)),
            extra => bail!("Unexpected argument: {extra}"),
        }
    }
    let shader =
        shader.context("Usage: prism-inspect <shader.wgsl> [--settings file.ron]")?;
    Ok(Args { shader, settings })
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let settings = match &args.settings {
        Some(path) => BindingSettings::from_file(path)
            .with_context(|| format!("Failed to load binding settings from {}", path.display()))?,
        None => BindingSettings::default(),
    };

    let source = std::fs::read_to_string(&args.shader)
        .with_context(|| format!("Failed to read {}", args.shader.display()))?;
    let label = args
        .shader
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "shader".to_owned());

    let module = WgslModule::parse(&label, &source)?;
    for (name, stage) in module.entry_points() {
        log::info!("Entry point '{name}' ({stage:?})");
    }
    let program = Program::create(&label, &module)?;

    let dump = ReflectionDump::new(program.reflection());
    let text = ron::ser::to_string_pretty(&dump, PrettyConfig::default())
        .context("Failed to serialize the reflection")?;
    println!("{text}");

    let device = HeadlessDevice::new();
    let vars = ProgramVars::create_with_settings(
        &device,
        program.reflection().clone(),
        true,
        None,
        settings,
    )
    .context("Failed to create the binding table")?;

    let mut list = RecordingCommandList::new();
    vars.commit(&mut list);

    println!();
    println!("// Commit of an unbound table ({} commands)", list.commands().len());
    for command in list.commands() {
        println!("{command}");
    }
    log::info!(
        "Headless device allocated {} bytes",
        device.allocated_bytes()
    );
    Ok(())
}
