mod utils;

#[cfg(test)]
mod tests {
    use crate::utils::text;
    use benchpress::loader::{self, LoadCallback};
    use benchpress::{Error, LoadError, MiniJinjaLoader, Runtime};
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use test_log::test;

    #[test(tokio::test)]
    async fn test_callback_loader_resolves_later() {
        let runtime = Runtime::new();
        runtime.register_loader(loader::from_callback(|name: &str, callback: LoadCallback| {
            let name = name.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                callback.call(if name == "known" { Some(text("late")) } else { None });
            });
        }));

        assert_eq!(runtime.render("known", None, None).await.unwrap(), "late");
        assert_eq!(runtime.render("other", None, None).await.unwrap(), "");
    }

    #[test(tokio::test)]
    async fn test_callback_never_called_fails_render() {
        let runtime = Runtime::new();
        runtime.register_loader(loader::from_callback(|_: &str, callback: LoadCallback| {
            drop(callback);
        }));

        let err = runtime.render("t", None, None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::TemplateLoadError { source: LoadError::Abandoned, .. }
        ));
    }

    #[test(tokio::test)]
    async fn test_dual_loader_accepts_both_conventions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let runtime = Runtime::new();
        runtime.register_loader(loader::from_dual(move |name: &str, callback: LoadCallback| {
            counter.fetch_add(1, Ordering::SeqCst);
            if name.starts_with("cb/") {
                callback.call(text("via callback"));
                None
            } else {
                Some(async { Ok::<_, LoadError>(Some(text("via future"))) }.boxed())
            }
        }));

        assert_eq!(runtime.render("cb/a", None, None).await.unwrap(), "via callback");
        assert_eq!(runtime.render("future/a", None, None).await.unwrap(), "via future");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test(tokio::test)]
    async fn test_future_loader_error_from_anyhow() {
        let runtime = Runtime::new();
        runtime.register_loader(loader::from_fn(|name: &str| {
            let name = name.to_string();
            async move {
                let err = anyhow::anyhow!("HTTP 404").context(format!("GET /templates/{name}"));
                Err(LoadError::from(err))
            }
        }));

        let err = runtime.render("missing", None, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to load template 'missing'. Original error: GET /templates/missing: HTTP 404"
        );
    }

    #[test(tokio::test)]
    async fn test_minijinja_templates_through_runtime() {
        let mut templates = MiniJinjaLoader::new();
        templates
            .add_template(
                "profile",
                "{% block name %}{{ __escape(user.name) }}{% endblock %} ({{ site }}) {{ badge(user.level) }}",
            )
            .add_template("empty", "");

        let runtime = Runtime::new();
        runtime.set_global("site", json!("forum"));
        runtime.register_helper("badge", |_, args| match args.first().and_then(|v| v.as_u64()) {
            Some(level) if level > 1 => Ok(json!(format!("*{level}*"))),
            _ => Ok(json!(null)),
        });
        runtime.register_loader(templates);

        let data = json!({"user": {"name": "<Ann>", "level": 3}});
        assert_eq!(
            runtime.render("profile", data.clone(), None).await.unwrap(),
            "&lt;Ann&gt; (forum) *3*"
        );
        assert_eq!(
            runtime.render("profile", data, Some("name")).await.unwrap(),
            "&lt;Ann&gt;"
        );
        assert_eq!(
            runtime
                .render("profile", json!({"user": {"name": "Bo", "level": 1}}), None)
                .await
                .unwrap(),
            "Bo (forum) "
        );
        assert_eq!(runtime.render("empty", None, None).await.unwrap(), "");
        assert_eq!(runtime.render("unknown", None, None).await.unwrap(), "");
    }

    #[test(tokio::test)]
    async fn test_minijinja_syntax_error_is_a_load_failure() {
        let mut templates = MiniJinjaLoader::new();
        templates.add_template("broken", "{% if %}");
        let runtime = Runtime::new();
        runtime.register_loader(templates);

        let err = runtime.render("broken", None, None).await.unwrap_err();
        assert!(matches!(err, Error::TemplateLoadError { ref name, .. } if name == "broken"));
    }
}
