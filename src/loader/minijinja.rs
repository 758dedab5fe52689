use super::interface::{LoadFuture, LoadResult, TemplateLoader};
use crate::helpers::HelperTable;
use crate::runtime::{CompiledTemplate, Guard, HelperCall, Iter};
use futures::future::{self, FutureExt};
use indexmap::IndexMap;
use log::{debug, warn};
use minijinja::value::Rest;
use minijinja::Environment;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{%[-+]?\s*block\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid block regex")
});

/// Loader that compiles MiniJinja template sources.
///
/// MiniJinja acts as the external compiler here: a loaded template renders
/// through MiniJinja, every helper in the runtime's table is callable as a
/// global function (routed through the helper dispatcher, so unknown or
/// failing helpers print nothing), and each `{% block %}` in the source is
/// exposed as a named block.
#[derive(Clone)]
pub struct MiniJinjaLoader {
    /// MiniJinja environment instance
    env: Environment<'static>,
    /// Template sources by name
    sources: Arc<IndexMap<String, String>>,
}

impl MiniJinjaLoader {
    /// Creates a new MiniJinjaLoader with no templates.
    pub fn new() -> Self {
        Self { env: Environment::new(), sources: Arc::new(IndexMap::new()) }
    }

    /// Adds a template source under `name`.
    ///
    /// Sources are compiled when the runtime first asks for them.
    ///
    /// # Arguments
    /// * `name` - Name to identify the template
    /// * `source` - Template content as string
    pub fn add_template(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> &mut Self {
        // Normalize the template name for cross-platform compatibility
        let name = name.into().replace('\\', "/");
        Arc::make_mut(&mut self.sources).insert(name, source.into());
        self
    }

    /// Returns a mutable reference to the underlying environment, for custom
    /// filters or auto-escape settings.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    fn compile(&self, name: &str) -> LoadResult {
        let Some(source) = self.sources.get(name) else {
            debug!("No MiniJinja source for '{name}'");
            return Ok(None);
        };

        let mut env = self.env.clone();
        let sources = Arc::clone(&self.sources);
        env.set_loader(move |requested| Ok(sources.get(requested).cloned()));
        // Surface syntax errors at load time rather than on every render.
        env.get_template(name)?;

        let env = Arc::new(env);
        let mut template = CompiledTemplate::new(render_fn(Arc::clone(&env), name, None));
        for block in block_names(source) {
            let compiled = CompiledTemplate::new(render_fn(Arc::clone(&env), name, Some(&block)));
            template = template.with_block(block, compiled);
        }
        Ok(Some(template))
    }
}

impl Default for MiniJinjaLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateLoader for MiniJinjaLoader {
    fn load(&self, name: &str) -> LoadFuture {
        future::ready(self.compile(name)).boxed()
    }
}

/// Block names declared in `source`, in order of appearance.
fn block_names(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in BLOCK_TAG.captures_iter(source) {
        let name = &captures[1];
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn render_fn(
    env: Arc<Environment<'static>>,
    name: &str,
    block: Option<&str>,
) -> impl Fn(&HelperTable, &Value, Guard, Iter, HelperCall) -> Value + Send + Sync + 'static {
    let name = name.to_string();
    let block = block.map(str::to_string);

    move |helpers: &HelperTable, context: &Value, _guard: Guard, _iter: Iter, helper: HelperCall| {
        let mut env = (*env).clone();
        for helper_name in helpers.names() {
            let helpers = helpers.clone();
            let this = context.clone();
            let dispatch_name = helper_name.to_string();
            env.add_function(helper_name.to_string(), move |args: Rest<minijinja::Value>| {
                let args: Vec<Value> = args
                    .iter()
                    .map(|arg| serde_json::to_value(arg).unwrap_or(Value::Null))
                    .collect();
                helper(&this, &helpers, &dispatch_name, &args)
            });
        }

        match render_with(&env, &name, block.as_deref(), context) {
            Ok(output) => Value::String(output),
            Err(err) => {
                warn!("MiniJinja render error in '{name}': {err}");
                Value::Null
            }
        }
    }
}

fn render_with(
    env: &Environment<'static>,
    name: &str,
    block: Option<&str>,
    context: &Value,
) -> Result<String, minijinja::Error> {
    let tmpl = env.get_template(name)?;
    let ctx = minijinja::Value::from_serialize(context);
    match block {
        Some(block) => {
            let mut captured = tmpl.render_captured(ctx)?;
            captured.with_state_mut(|state| state.render_block(block))
        }
        None => tmpl.render(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::HelperError;
    use crate::runtime::run;
    use futures::executor::block_on;
    use serde_json::json;

    fn load(loader: &MiniJinjaLoader, name: &str) -> CompiledTemplate {
        block_on(loader.load(name)).unwrap().unwrap()
    }

    #[test]
    fn test_unknown_template_is_none() {
        let loader = MiniJinjaLoader::new();
        assert!(block_on(loader.load("missing")).unwrap().is_none());
    }

    #[test]
    fn test_syntax_error_fails_load() {
        let mut loader = MiniJinjaLoader::new();
        loader.add_template("broken", "{{ unclosed");
        assert!(block_on(loader.load("broken")).is_err());
    }

    #[test]
    fn test_renders_context() {
        let mut loader = MiniJinjaLoader::new();
        loader.add_template("hello", "Hello, {{ name }}!");
        let template = load(&loader, "hello");

        let out = run(&HelperTable::new(), &json!({"name": "World"}), &template);
        assert_eq!(out, "Hello, World!");
    }

    #[test]
    fn test_helpers_are_global_functions() {
        let mut loader = MiniJinjaLoader::new();
        loader.add_template("t", "{{ shout(name, 2) }}|{{ broken() }}|{{ nothing() }}");
        let template = load(&loader, "t");

        let mut helpers = HelperTable::new();
        helpers.register("shout", |_, args| {
            let times = args[1].as_u64().unwrap_or(1) as usize;
            Ok(json!(args[0].as_str().unwrap_or_default().to_uppercase().repeat(times)))
        });
        helpers.register("broken", |_, _| Err(HelperError::msg("nope")));
        helpers.register("nothing", |_, _| Ok(json!(0)));

        let out = run(&helpers, &json!({"name": "hi"}), &template);
        assert_eq!(out, "HIHI||");
    }

    #[test]
    fn test_blocks_are_exposed() {
        let mut loader = MiniJinjaLoader::new();
        loader.add_template(
            "page",
            "<h1>{% block title %}{{ title }}{% endblock %}</h1>{%- block body %}<p>{{ body }}</p>{% endblock %}",
        );
        let template = load(&loader, "page");
        assert_eq!(template.block_names().collect::<Vec<_>>(), vec!["title", "body"]);

        let data = json!({"title": "Home", "body": "Welcome"});
        let title = template.block("title").unwrap();
        assert_eq!(run(&HelperTable::new(), &data, title), "Home");
        assert_eq!(run(&HelperTable::new(), &data, &template), "<h1>Home</h1><p>Welcome</p>");
    }

    #[test]
    fn test_includes_resolve_other_sources() {
        let mut loader = MiniJinjaLoader::new();
        loader
            .add_template("partials/name", "<b>{{ name }}</b>")
            .add_template("card", "Card: {% include 'partials/name' %}");
        let template = load(&loader, "card");

        let out = run(&HelperTable::new(), &json!({"name": "Ada"}), &template);
        assert_eq!(out, "Card: <b>Ada</b>");
    }

    #[test]
    fn test_block_names_deduplicates() {
        let names = block_names("{% block a %}{% endblock %}{%- block b -%}{% block a %}");
        assert_eq!(names, vec!["a", "b"]);
    }
}
