//! protoc plugin entrypoint.
//!
//! protoc hands a serialized `CodeGeneratorRequest` on stdin and expects a
//! serialized `CodeGeneratorResponse` on stdout. Everything else (logging
//! included) must stay off stdout.

use std::collections::HashMap;
use std::io::{Read, Write};

use anyhow::{Context, Result};
use prost::Message;
use tracing::debug;

use gateway_ts_codegen::Generator;
use gateway_ts_core::descriptor::{
    code_generator_response, CodeGeneratorRequest, CodeGeneratorResponse,
};
use gateway_ts_core::options::{parse_parameter, Options};

fn main() -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("reading the code generation request from stdin")?;
    let request = CodeGeneratorRequest::decode(input.as_slice())
        .context("decoding the code generation request")?;

    let params = parse_parameter(request.parameter.as_deref().unwrap_or(""));
    init_logging(&params);
    debug!(
        files = request.file_to_generate.len(),
        "received generation request"
    );

    let mut response = match run(&params, &request) {
        Ok(response) => response,
        // protoc reports generator failures through the response error
        // field, not the exit code
        Err(err) => CodeGeneratorResponse {
            error: Some(format!("{err:#}")),
            ..CodeGeneratorResponse::default()
        },
    };
    response.supported_features = Some(code_generator_response::FEATURE_PROTO3_OPTIONAL);

    let mut output = Vec::with_capacity(response.encoded_len());
    response
        .encode(&mut output)
        .context("encoding the code generation response")?;
    std::io::stdout()
        .write_all(&output)
        .context("writing the code generation response to stdout")?;
    Ok(())
}

fn run(
    params: &HashMap<String, String>,
    request: &CodeGeneratorRequest,
) -> Result<CodeGeneratorResponse> {
    let options = Options::from_params(params);
    let mut generator = Generator::new(options)?;
    generator.generate(request)
}

/// Wires tracing to stderr when `logtostderr` is passed; `loglevel` picks the
/// verbosity and understands an env-filter directive string too.
fn init_logging(params: &HashMap<String, String>) {
    if !params.contains_key("logtostderr") {
        return;
    }
    let level = params
        .get("loglevel")
        .filter(|v| !v.is_empty())
        .map(String::as_str)
        .unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();
}
