//! Rolldown plugin that backs the external Cesium declaration inside the
//! module graph.
//!
//! When the library is external, imports of `cesium` in application code
//! become reads of the global the prebuilt `Cesium.js` assigns:
//!
//! ```text
//! import { Viewer, Cartesian3 as C3 } from 'cesium';
//!        ↓
//! const { Viewer, Cartesian3: C3 } = globalThis.Cesium;
//! ```
//!
//! The rewrites are pattern based, like the asset URL rewriting in
//! fob-bundler. `CESIUM_BASE_URL` is not touched here: it goes through
//! rolldown's `define`, which only replaces identifier references.
//!
//! `export * from 'cesium'` has no global equivalent (the export names are
//! not known statically); it is left in place and reported.

use crate::overrides::ConfigOverrides;
use regex::{Captures, Regex};
use rolldown_common::ResolvedExternal;
use rolldown_plugin::{
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookTransformArgs,
    HookTransformOutput, HookTransformReturn, HookUsage, Plugin, PluginContext,
    SharedTransformPluginContext,
};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

/// Result of rewriting one module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Number of import and re-export statements rewritten to global reads
    pub imports: usize,
    /// `export * from` statements left as real imports
    pub star_reexports: usize,
}

impl RewriteReport {
    pub fn is_empty(&self) -> bool {
        self.imports == 0 && self.star_reexports == 0
    }
}

/// Rewrites imports of one module id into reads of a global
#[derive(Debug, Clone)]
pub struct GlobalImportRewriter {
    module_id: String,
    global_expr: String,
    type_only: Option<Regex>,
    default_and_namespace: Option<Regex>,
    namespace: Option<Regex>,
    default_and_named: Option<Regex>,
    default_only: Option<Regex>,
    named: Option<Regex>,
    reexport_namespace: Option<Regex>,
    reexport_named: Option<Regex>,
    reexport_all: Option<Regex>,
    side_effect: Option<Regex>,
    dynamic: Option<Regex>,
}

impl GlobalImportRewriter {
    pub fn new(module_id: &str, global_name: &str) -> Self {
        let m = regex::escape(module_id);
        let from = format!(r#"\s*from\s*['"]{m}['"]\s*;?"#);
        let compile = |pattern: String| Regex::new(&pattern).ok();

        Self {
            module_id: module_id.to_string(),
            global_expr: format!("globalThis.{global_name}"),
            type_only: compile(format!(r#"import\s+type\s+[^;'"]*?{from}"#)),
            default_and_namespace: compile(format!(
                r"import\s+([\w$]+)\s*,\s*\*\s*as\s+([\w$]+){from}"
            )),
            namespace: compile(format!(r"import\s*\*\s*as\s+([\w$]+){from}")),
            default_and_named: compile(format!(
                r"import\s+([\w$]+)\s*,\s*\{{([^}}]*)\}}{from}"
            )),
            default_only: compile(format!(r"import\s+([\w$]+){from}")),
            named: compile(format!(r"import\s*\{{([^}}]*)\}}{from}")),
            reexport_namespace: compile(format!(r"export\s*\*\s*as\s+([\w$]+){from}")),
            reexport_named: compile(format!(r"export\s*\{{([^}}]*)\}}{from}")),
            reexport_all: compile(format!(r"export\s*\*{from}")),
            side_effect: compile(format!(r#"import\s*['"]{m}['"]\s*;?"#)),
            dynamic: compile(format!(r#"import\s*\(\s*['"]{m}['"]\s*\)"#)),
        }
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// Rewrite all recognized imports and re-exports.
    pub fn rewrite(&self, code: &str) -> (String, RewriteReport) {
        let mut report = RewriteReport::default();
        if !code.contains(self.module_id.as_str()) {
            return (code.to_string(), report);
        }

        let global = self.global_expr.as_str();
        let mut rewritten = code.to_string();
        let count = &mut report.imports;

        // Type-only imports vanish; the TypeScript transform would drop them anyway.
        replace(self.type_only.as_ref(), &mut rewritten, count, |_| String::new());

        replace(self.default_and_namespace.as_ref(), &mut rewritten, count, |caps| {
            format!("const {} = {global}; const {} = {global};", &caps[1], &caps[2])
        });

        replace(self.namespace.as_ref(), &mut rewritten, count, |caps| {
            format!("const {} = {global};", &caps[1])
        });

        replace(self.default_and_named.as_ref(), &mut rewritten, count, |caps| {
            format!(
                "const {} = {global}; const {{ {} }} = {global};",
                &caps[1],
                destructure(&caps[2])
            )
        });

        replace(self.default_only.as_ref(), &mut rewritten, count, |caps| {
            format!("const {} = {global};", &caps[1])
        });

        replace(self.named.as_ref(), &mut rewritten, count, |caps| {
            let bindings = destructure(&caps[1]);
            if bindings.is_empty() {
                String::new()
            } else {
                format!("const {{ {bindings} }} = {global};")
            }
        });

        replace(self.reexport_namespace.as_ref(), &mut rewritten, count, |caps| {
            format!("export const {} = {global};", &caps[1])
        });

        replace(self.reexport_named.as_ref(), &mut rewritten, count, |caps| {
            let bindings = destructure(&caps[1]);
            if bindings.is_empty() {
                String::new()
            } else {
                format!("export const {{ {bindings} }} = {global};")
            }
        });

        replace(self.side_effect.as_ref(), &mut rewritten, count, |_| String::new());

        replace(self.dynamic.as_ref(), &mut rewritten, count, |_| {
            format!("Promise.resolve({global})")
        });

        if let Some(re) = &self.reexport_all {
            report.star_reexports = re.find_iter(&rewritten).count();
        }

        (rewritten, report)
    }
}

fn replace<F>(re: Option<&Regex>, code: &mut String, count: &mut usize, f: F)
where
    F: Fn(&Captures<'_>) -> String,
{
    let Some(re) = re else {
        return;
    };
    let matches = re.find_iter(code.as_str()).count();
    if matches == 0 {
        return;
    }
    *code = re
        .replace_all(code.as_str(), |caps: &Captures<'_>| f(caps))
        .into_owned();
    *count += matches;
}

/// Convert an import specifier list into an object destructuring pattern.
///
/// `Viewer, Cartesian3 as C3, type Entity` becomes `Viewer, Cartesian3: C3`.
fn destructure(specifiers: &str) -> String {
    specifiers
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with("type "))
        .map(|s| match s.split_once(" as ") {
            Some((imported, local)) => format!("{}: {}", imported.trim(), local.trim()),
            None => s.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns true for module ids the rewrites apply to
fn is_script_module(id: &str) -> bool {
    let path = id.split(['?', '#']).next().unwrap_or(id);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            matches!(
                ext,
                "js" | "mjs" | "cjs" | "jsx" | "ts" | "mts" | "cts" | "tsx" | "vue" | "svelte"
            )
        })
        .unwrap_or(false)
}

/// Rolldown plugin rewriting imports of the external library into global reads
#[derive(Debug, Clone)]
pub struct CesiumGlobalsPlugin {
    imports: Option<GlobalImportRewriter>,
}

impl CesiumGlobalsPlugin {
    /// Build the plugin from the session's overrides.
    ///
    /// Without an external declaration (serve sessions, rebuild builds) the
    /// plugin is inert.
    pub fn from_overrides(overrides: &ConfigOverrides) -> Self {
        let imports = overrides.external.first().and_then(|module| {
            overrides
                .globals
                .get(module)
                .map(|global| GlobalImportRewriter::new(module, global))
        });

        Self { imports }
    }

    /// Whether imports of the library are rewritten to the global
    pub fn rewrites_imports(&self) -> bool {
        self.imports.is_some()
    }

    /// Apply the import rewrite to one module's code
    pub fn rewrite(&self, code: &str) -> (String, RewriteReport) {
        match &self.imports {
            Some(imports) => imports.rewrite(code),
            None => (code.to_string(), RewriteReport::default()),
        }
    }
}

impl Plugin for CesiumGlobalsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "fob-cesium".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Transform
    }

    /// Mark the library external so anything the rewrite missed is not bundled
    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let external = self
            .imports
            .as_ref()
            .map(|imports| imports.module_id() == specifier)
            .unwrap_or(false);

        async move {
            if !external {
                return Ok(None);
            }

            Ok(Some(HookResolveIdOutput {
                id: specifier.into(),
                external: Some(ResolvedExternal::Bool(true)),
                ..Default::default()
            }))
        }
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let id = args.id.to_string();
        let code = args.code.to_string();
        let plugin = self.clone();

        async move {
            if !plugin.rewrites_imports() || !is_script_module(&id) {
                return Ok(None);
            }

            let (rewritten, report) = plugin.rewrite(&code);

            if report.star_reexports > 0 {
                warn!(
                    module = %id,
                    count = report.star_reexports,
                    "[fob-cesium] `export * from` the external library stays an import; \
                     re-export named bindings instead"
                );
            }

            if report.imports == 0 {
                return Ok(None);
            }

            debug!(
                module = %id,
                imports = report.imports,
                "[fob-cesium] Rewrote imports to global"
            );

            Ok(Some(HookTransformOutput {
                code: Some(rewritten),
                map: None,
                side_effects: None,
                module_type: None,
            }))
        }
    }
}
