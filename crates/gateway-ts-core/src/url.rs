//! URL template policy: path-parameter interpolation and query-string
//! derivation for a binding.
//!
//! The emitter renders whatever this module produces verbatim; the decisions
//! about which fields are consumed by the path, how they are cased and when
//! a query string is appended all live here.

use std::sync::OnceLock;

use regex::Regex;

use crate::data::Method;
use crate::options::Options;

/// Matches `{field}` or `{field=pattern}` and captures the field name.
fn path_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^=}/]+)(?:=([^}]+))?\}").expect("path param regex"))
}

/// A URL template rewritten into a client-side template expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedUrl {
    /// TypeScript template-literal body, path parameters interpolated.
    pub expression: String,
    /// Cased names of the fields consumed by path parameters. The runtime
    /// excludes these from query-string serialization, and the emitter from
    /// any serialized body.
    pub path_params: Vec<String>,
}

/// Rewrites a binding's URL template: every `{field}`/`{field=pattern}`
/// becomes `${req.field}` (cased per options), and GET/DELETE bindings get
/// the remaining request fields appended as a query string, joined with `?`
/// or `&` depending on whether the template already carries one.
pub fn render_url(options: &Options, method: &Method) -> RenderedUrl {
    let mut url = method.url.clone();
    let mut path_params = Vec::new();

    for capture in path_param_regex().captures_iter(&method.url) {
        let expression = capture.get(0).expect("whole match").as_str();
        let field_name = options.field_name(&capture[1]);
        url = url.replace(expression, &format!("${{req.{field_name}}}"));
        path_params.push(field_name);
    }

    if method.http_verb.query_based() {
        let quoted: Vec<String> = path_params.iter().map(|p| format!("\"{p}\"")).collect();
        let search_params = format!(
            "${{fm.renderURLSearchParams(req, [{}])}}",
            quoted.join(", ")
        );
        match url.split_once('?') {
            Some((_, query)) if !query.is_empty() => {
                url = format!("{}&{search_params}", url.trim_end_matches('&'));
            }
            Some(_) => {
                // trailing bare "?" in the template
                url = format!("{url}{search_params}");
            }
            None => {
                url = format!("{url}?{search_params}");
            }
        }
    }

    RenderedUrl {
        expression: url,
        path_params,
    }
}

/// The `req[...]` accessor for a named request-body selector, cased per
/// options. `None` and `*` mean the whole request; the empty string no body.
pub fn body_accessor(options: &Options, body: Option<&str>) -> Option<String> {
    match body {
        None | Some("*") => Some("req".to_string()),
        Some("") => None,
        Some(selector) => Some(format!("req[\"{}\"]", options.field_name(selector))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FieldKind, HttpVerb, MethodArgument, TypeReference};

    fn method(verb: HttpVerb, url: &str) -> Method {
        let arg = || MethodArgument {
            type_ref: TypeReference::singular(FieldKind::Named(".pkg.T".to_string()), false),
        };
        Method {
            name: "M".to_string(),
            url: url.to_string(),
            input: arg(),
            output: arg(),
            server_streaming: false,
            http_verb: verb,
            http_request_body: None,
            binding_index: 0,
            client_method_name: "M".to_string(),
        }
    }

    #[test]
    fn get_with_path_param_appends_query_string() {
        let rendered = render_url(&Options::default(), &method(HttpVerb::Get, "/v1/items/{id}"));
        assert_eq!(
            rendered.expression,
            "/v1/items/${req.id}?${fm.renderURLSearchParams(req, [\"id\"])}"
        );
        assert_eq!(rendered.path_params, ["id"]);
    }

    #[test]
    fn path_params_are_cased_per_options() {
        let rendered = render_url(
            &Options::default(),
            &method(HttpVerb::Post, "/v1/{user_id}/items/{item_id=items/*}"),
        );
        assert_eq!(rendered.expression, "/v1/${req.userId}/items/${req.itemId}");
        assert_eq!(rendered.path_params, ["userId", "itemId"]);

        let proto_names = Options {
            use_proto_names: true,
            ..Options::default()
        };
        let rendered = render_url(&proto_names, &method(HttpVerb::Post, "/v1/{user_id}"));
        assert_eq!(rendered.expression, "/v1/${req.user_id}");
    }

    #[test]
    fn existing_query_string_is_extended_not_duplicated() {
        let rendered = render_url(
            &Options::default(),
            &method(HttpVerb::Delete, "/v1/items/{id}?force=true&"),
        );
        assert_eq!(
            rendered.expression,
            "/v1/items/${req.id}?force=true&${fm.renderURLSearchParams(req, [\"id\"])}"
        );
    }

    #[test]
    fn post_urls_are_left_without_query_string() {
        let rendered = render_url(&Options::default(), &method(HttpVerb::Post, "/v1/items/{id}"));
        assert_eq!(rendered.expression, "/v1/items/${req.id}");
    }

    #[test]
    fn body_accessor_cases_the_selector() {
        let opts = Options::default();
        assert_eq!(body_accessor(&opts, None).as_deref(), Some("req"));
        assert_eq!(body_accessor(&opts, Some("*")).as_deref(), Some("req"));
        assert_eq!(body_accessor(&opts, Some("")), None);
        assert_eq!(
            body_accessor(&opts, Some("user_update")).as_deref(),
            Some("req[\"userUpdate\"]")
        );

        let proto_names = Options {
            use_proto_names: true,
            ..Options::default()
        };
        assert_eq!(
            body_accessor(&proto_names, Some("user_update")).as_deref(),
            Some("req[\"user_update\"]")
        );
    }
}
