//! TypeScript emission for gateway clients.
//!
//! Consumes the resolved model produced by `gateway-ts-core` and renders one
//! `.pb.ts` module per requested proto file, plus the shared fetch runtime
//! when any rendered file declares service methods.

use anyhow::{Context, Result};
use tracing::debug;

use gateway_ts_core::descriptor::{code_generator_response, CodeGeneratorRequest, CodeGeneratorResponse};
use gateway_ts_core::{Options, Registry};

mod render;

/// The shared client runtime, emitted once per invocation next to the
/// generated modules.
const FETCH_MODULE: &str = include_str!("../assets/fetch.ts");

pub struct Generator {
    registry: Registry,
}

impl Generator {
    pub fn new(options: Options) -> Result<Generator> {
        let registry = Registry::new(options).context("configuring the type registry")?;
        Ok(Generator { registry })
    }

    /// Runs analysis over the whole request and renders every file protoc
    /// asked for. Files that are present only as dependencies contribute
    /// their types to the registry but produce no output.
    pub fn generate(&mut self, req: &CodeGeneratorRequest) -> Result<CodeGeneratorResponse> {
        let files = self
            .registry
            .analyse(req)
            .context("analysing the code generation request")?;

        let mut response = CodeGeneratorResponse::default();
        let mut requires_fetch_module = false;
        for file_data in files.values() {
            if !self.registry.is_file_to_generate(&file_data.name) {
                debug!(file = %file_data.name, "dependency only, skipping output");
                continue;
            }
            debug!(file = %file_data.name, output = %file_data.ts_file_name, "rendering");
            let content = render::render_file(&self.registry, file_data)
                .with_context(|| format!("rendering {}", file_data.ts_file_name))?;
            response.file.push(code_generator_response::File {
                name: Some(file_data.ts_file_name.clone()),
                insertion_point: None,
                content: Some(content),
            });
            requires_fetch_module = requires_fetch_module || file_data.requires_fetch_module();
        }

        if requires_fetch_module {
            response.file.push(self.fetch_module_file());
        }

        Ok(response)
    }

    fn fetch_module_file(&self) -> code_generator_response::File {
        let options = &self.registry.options;
        let directory = options.fetch_module_directory.trim_matches('/');
        let name = if directory.is_empty() || directory == "." {
            options.fetch_module_filename.clone()
        } else {
            format!("{directory}/{}", options.fetch_module_filename)
        };
        code_generator_response::File {
            name: Some(name),
            insertion_point: None,
            content: Some(format!(
                "{}{}",
                render::styling_header(options),
                FETCH_MODULE
            )),
        }
    }
}
