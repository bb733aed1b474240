//! Combined-expression matching engine.
//!
//! Every registered entry is rendered into one anchored expression and
//! the whole registry is evaluated in a single [`RegexSet`] pass, the
//! technique described in
//! <https://nikic.github.io/2014/02/18/Fast-request-routing-using-regular-expressions.html>.
//! The set plays the role of a branch-reset alternation: it reports
//! which alternatives matched, and captures are then pulled from the
//! matching entry's own compiled expression, so extraction cost does
//! not grow with the number of registered routes.

use http::Method;
use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use tracing::debug;

use crate::error::CompileError;
use crate::outcome::{BoundParams, DispatchOutcome};
use crate::registry::{RouteEntry, RouteRegistry, RouteToken};

/// Frozen, compiled form of a registry. Built once per registry
/// mutation cycle and shared read-only while serving; embedders that
/// change routes while serving rebuild and atomically swap.
#[derive(Debug)]
pub struct Dispatcher<H> {
    entries: Vec<CompiledEntry<H>>,
    set: RegexSet,
}

#[derive(Debug)]
struct CompiledEntry<H> {
    route: RouteEntry<H>,
    /// This entry's own anchored expression, for capture extraction.
    regex: Regex,
    /// Standalone anchored re-check per placeholder, in declaration
    /// order. The combined pass alone cannot prove a capture satisfies
    /// this entry's declared pattern.
    checks: Vec<Regex>,
    /// Segments joined in index order; the exact-equality side of the
    /// disambiguation pass for placeholder-free entries.
    literal: String,
}

impl<H> Dispatcher<H> {
    pub fn compile(registry: &RouteRegistry<H>) -> Result<Self, CompileError>
    where
        H: Clone,
    {
        let mut entries = Vec::with_capacity(registry.len());
        let mut alternatives = Vec::with_capacity(registry.len());

        for (index, route) in registry.routes().iter().enumerate() {
            // Validate every declared pattern standalone first, so a
            // bad override is reported against its placeholder rather
            // than as a failure of the whole entry expression.
            let mut checks = Vec::with_capacity(route.placeholders().len());
            for placeholder in route.placeholders() {
                let check = Regex::new(&format!("^(?:{})$", placeholder.pattern)).map_err(
                    |source| CompileError::InvalidPattern {
                        index,
                        route: route.template(),
                        name: placeholder.name.clone(),
                        pattern: placeholder.pattern.clone(),
                        source,
                    },
                )?;
                checks.push(check);
            }

            let expression = entry_expression(route);
            let regex = RegexBuilder::new(&expression)
                .case_insensitive(true)
                .build()
                .map_err(|source| CompileError::InvalidRoute {
                    index,
                    route: route.template(),
                    source,
                })?;

            alternatives.push(expression);
            entries.push(CompiledEntry {
                literal: route.literal_path(),
                route: route.clone(),
                regex,
                checks,
            });
        }

        let set = RegexSetBuilder::new(&alternatives)
            .case_insensitive(true)
            .build()
            .map_err(CompileError::Combined)?;

        debug!(routes = entries.len(), "compiled dispatch table");
        Ok(Self { entries, set })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry<H>> {
        self.entries.iter().map(|e| &e.route)
    }

    /// Resolve `(method, path)` to exactly one outcome. Never fails:
    /// the expensive verification happened at compile time.
    pub fn dispatch(&self, method: &Method, path: &str) -> DispatchOutcome<'_, H> {
        // One pass over the combined alternation. No alternative
        // matching means no entry's shape fits this path at all.
        let matched = self.set.matches(path);
        if !matched.matched_any() {
            return DispatchOutcome::NotFound;
        }

        // A set hit only proves that some alternative matched; entries
        // sharing a literal shape land on the same alternative. Verify
        // each reported entry independently, accumulating the
        // allowed-method union across all structural candidates.
        let mut candidates: Vec<(usize, BoundParams)> = Vec::new();
        let mut allowed: Vec<Method> = Vec::new();
        for index in matched.iter() {
            let Some(params) = self.entries[index].verify(path) else {
                continue;
            };
            for m in self.entries[index].route.methods() {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
            candidates.push((index, params));
        }

        // First registered candidate allowing the method wins.
        if let Some((index, params)) = candidates
            .into_iter()
            .find(|(index, _)| self.entries[*index].route.allows(method))
        {
            return DispatchOutcome::Found {
                entry: &self.entries[index].route,
                params,
            };
        }

        if allowed.is_empty() {
            // Possible only with adversarially coincident templates:
            // every reported alternative failed re-verification.
            DispatchOutcome::NotFound
        } else {
            DispatchOutcome::MethodNotAllowed { allowed }
        }
    }
}

impl<H> CompiledEntry<H> {
    /// Structural re-verification of one entry against the path.
    /// `Some(params)` makes this entry a candidate regardless of
    /// method; `None` rejects it even though the set pass matched.
    fn verify(&self, path: &str) -> Option<BoundParams> {
        if self.route.placeholders().is_empty() {
            return (self.literal == path).then(BoundParams::new);
        }

        // Every literal segment must align exactly with the path
        // component at its own index.
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let aligned = self
            .route
            .segments()
            .iter()
            .filter(|segment| components.get(segment.index).copied() == Some(segment.literal.as_str()))
            .count();
        if aligned != self.route.segments().len() {
            return None;
        }

        // Captures come from this entry's own expression (whole-match
        // group discarded) and must each satisfy the placeholder's
        // declared pattern re-applied standalone.
        let captures = self.regex.captures(path)?;
        let mut params = BoundParams::with_capacity(self.checks.len());
        for (slot, (placeholder, check)) in
            self.route.placeholders().iter().zip(&self.checks).enumerate()
        {
            let value = captures.name(&slot_name(slot))?.as_str();
            if !check.is_match(value) {
                return None;
            }
            params.insert(placeholder.name.clone(), value.to_string());
        }
        Some(params)
    }
}

/// Capture-group name for the placeholder at `slot`. Generated names
/// keep extraction stable even when a declared pattern carries capture
/// groups of its own.
fn slot_name(slot: usize) -> String {
    format!("p{}", slot)
}

/// Render one entry as an anchored alternative: per position, `/` plus
/// the escaped literal or a named capture of the placeholder's
/// pattern. The empty entry renders as the literal root.
fn entry_expression<H>(route: &RouteEntry<H>) -> String {
    if route.segments().is_empty() && route.placeholders().is_empty() {
        return "^/$".to_string();
    }
    let mut expression = String::from("^");
    let mut slot = 0;
    for token in route.tokens() {
        expression.push('/');
        match token {
            RouteToken::Literal(segment) => expression.push_str(&regex::escape(&segment.literal)),
            RouteToken::Placeholder(placeholder) => {
                expression.push_str(&format!("(?P<{}>", slot_name(slot)));
                expression.push_str(&placeholder.pattern);
                expression.push(')');
                slot += 1;
            }
        }
    }
    expression.push('$');
    expression
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::parser::PatternOverrides;
    use crate::registry::RouteRegistry;

    fn no_overrides() -> PatternOverrides {
        PatternOverrides::new()
    }

    fn found_handler<'a>(outcome: &DispatchOutcome<'a, &'static str>) -> Option<&'static str> {
        match outcome {
            DispatchOutcome::Found { entry, .. } => Some(*entry.handler()),
            _ => None,
        }
    }

    #[test]
    fn binds_params_and_rejects_pattern_mismatch() -> anyhow::Result<()> {
        let mut registry = RouteRegistry::new();
        let overrides = PatternOverrides::from([("id".to_string(), r"\d+".to_string())]);
        registry.add_route(&[Method::GET], "/users/{id}", "show_user", &overrides)?;
        let dispatcher = Dispatcher::compile(&registry)?;

        match dispatcher.dispatch(&Method::GET, "/users/42") {
            DispatchOutcome::Found { entry, params } => {
                assert_eq!(*entry.handler(), "show_user");
                assert_eq!(params.get("id").map(String::as_str), Some("42"));
            }
            other => panic!("expected Found, got {:?}", other),
        }
        assert!(matches!(
            dispatcher.dispatch(&Method::GET, "/users/abc"),
            DispatchOutcome::NotFound
        ));
        Ok(())
    }

    #[test]
    fn method_not_allowed_unions_all_candidates() -> anyhow::Result<()> {
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/widgets/{id}", "get_widget", &no_overrides())?;
        registry.add_route(&[Method::POST], "/widgets/{id}", "post_widget", &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;

        match dispatcher.dispatch(&Method::DELETE, "/widgets/9") {
            DispatchOutcome::MethodNotAllowed { allowed } => {
                assert!(allowed.contains(&Method::GET));
                assert!(allowed.contains(&Method::POST));
            }
            other => panic!("expected MethodNotAllowed, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn first_registered_candidate_wins() -> anyhow::Result<()> {
        // Static first.
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/a/b", "static", &no_overrides())?;
        registry.add_route(&[Method::GET], "/a/{x}", "param", &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;
        assert_eq!(
            found_handler(&dispatcher.dispatch(&Method::GET, "/a/b")),
            Some("static")
        );

        // Parameterized first: same path, other winner.
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/a/{x}", "param", &no_overrides())?;
        registry.add_route(&[Method::GET], "/a/b", "static", &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;
        match dispatcher.dispatch(&Method::GET, "/a/b") {
            DispatchOutcome::Found { entry, params } => {
                assert_eq!(*entry.handler(), "param");
                assert_eq!(params.get("x").map(String::as_str), Some("b"));
            }
            other => panic!("expected Found, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn unmatched_shape_is_not_found_never_method_not_allowed() -> anyhow::Result<()> {
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/somewhere", (), &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;
        assert!(matches!(
            dispatcher.dispatch(&Method::POST, "/nowhere"),
            DispatchOutcome::NotFound
        ));
        Ok(())
    }

    #[test]
    fn stricter_sibling_pattern_is_never_attributed() -> anyhow::Result<()> {
        // Both entries share the structural shape /x/{...}; the path
        // satisfies only the looser pattern and must bind to it alone.
        let mut registry = RouteRegistry::new();
        let strict = PatternOverrides::from([("num".to_string(), r"\d+".to_string())]);
        registry.add_route(&[Method::GET], "/x/{num}", "numeric", &strict)?;
        registry.add_route(&[Method::GET], "/x/{name}", "named", &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;

        match dispatcher.dispatch(&Method::GET, "/x/zed") {
            DispatchOutcome::Found { entry, params } => {
                assert_eq!(*entry.handler(), "named");
                assert_eq!(params.get("name").map(String::as_str), Some("zed"));
                assert!(params.get("num").is_none());
            }
            other => panic!("expected Found, got {:?}", other),
        }
        // A numeric path prefers the first-registered strict entry.
        assert_eq!(
            found_handler(&dispatcher.dispatch(&Method::GET, "/x/7")),
            Some("numeric")
        );
        Ok(())
    }

    #[test]
    fn coincident_templates_resolve_by_method() -> anyhow::Result<()> {
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/same", "get_same", &no_overrides())?;
        registry.add_route(&[Method::POST], "/same", "post_same", &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;

        assert_eq!(
            found_handler(&dispatcher.dispatch(&Method::GET, "/same")),
            Some("get_same")
        );
        assert_eq!(
            found_handler(&dispatcher.dispatch(&Method::POST, "/same")),
            Some("post_same")
        );
        match dispatcher.dispatch(&Method::PATCH, "/same") {
            DispatchOutcome::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            other => panic!("expected MethodNotAllowed, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn literal_verification_is_exact_even_though_the_set_is_not() -> anyhow::Result<()> {
        // The combined pass matches case-insensitively, so the set
        // reports the alternative; exact re-verification then rejects
        // every candidate and the outcome falls through to NotFound.
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/users", (), &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;
        assert!(matches!(
            dispatcher.dispatch(&Method::GET, "/USERS"),
            DispatchOutcome::NotFound
        ));

        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/Admin/{id}", (), &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;
        assert!(matches!(
            dispatcher.dispatch(&Method::GET, "/admin/3"),
            DispatchOutcome::NotFound
        ));
        Ok(())
    }

    #[test]
    fn root_route_matches_root_path() -> anyhow::Result<()> {
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/", "root", &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;
        assert_eq!(
            found_handler(&dispatcher.dispatch(&Method::GET, "/")),
            Some("root")
        );
        assert!(matches!(
            dispatcher.dispatch(&Method::GET, "/sub"),
            DispatchOutcome::NotFound
        ));
        Ok(())
    }

    #[test]
    fn params_keep_declaration_order_and_raw_values() -> anyhow::Result<()> {
        let mut registry = RouteRegistry::new();
        registry.add_route(
            &[Method::GET],
            "/repos/{owner}/files/{name}",
            (),
            &no_overrides(),
        )?;
        let dispatcher = Dispatcher::compile(&registry)?;
        match dispatcher.dispatch(&Method::GET, "/repos/octo/files/a%20b.txt") {
            DispatchOutcome::Found { params, .. } => {
                let pairs: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                // Raw substrings, declaration order, no decoding.
                assert_eq!(pairs, vec![("owner", "octo"), ("name", "a%20b.txt")]);
            }
            other => panic!("expected Found, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn trailing_slash_is_not_normalized() -> anyhow::Result<()> {
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/users", (), &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;
        assert!(matches!(
            dispatcher.dispatch(&Method::GET, "/users/"),
            DispatchOutcome::NotFound
        ));
        Ok(())
    }

    #[test]
    fn empty_registry_dispatches_not_found() -> anyhow::Result<()> {
        let registry: RouteRegistry<()> = RouteRegistry::new();
        let dispatcher = Dispatcher::compile(&registry)?;
        assert!(dispatcher.is_empty());
        assert!(matches!(
            dispatcher.dispatch(&Method::GET, "/"),
            DispatchOutcome::NotFound
        ));
        Ok(())
    }

    #[test]
    fn invalid_pattern_override_names_the_entry() -> anyhow::Result<()> {
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/fine", (), &no_overrides())?;
        let broken = PatternOverrides::from([("id".to_string(), "[".to_string())]);
        registry.add_route(&[Method::GET], "/users/{id}", (), &broken)?;

        match Dispatcher::compile(&registry) {
            Err(CompileError::InvalidPattern { index, route, name, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(route, "/users/{id}");
                assert_eq!(name, "id");
            }
            other => panic!("expected CompileError, got {:?}", other.map(|d| d.len())),
        }
        Ok(())
    }

    #[test]
    fn capture_groups_inside_patterns_do_not_shift_bindings() -> anyhow::Result<()> {
        let overrides = PatternOverrides::from([
            ("ver".to_string(), r"v(\d+)".to_string()),
            ("file".to_string(), r"[^/]+".to_string()),
        ]);
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/dl/{ver}/{file}", (), &overrides)?;
        let dispatcher = Dispatcher::compile(&registry)?;

        match dispatcher.dispatch(&Method::GET, "/dl/v2/setup.bin") {
            DispatchOutcome::Found { params, .. } => {
                assert_eq!(params.get("ver").map(String::as_str), Some("v2"));
                assert_eq!(params.get("file").map(String::as_str), Some("setup.bin"));
            }
            other => panic!("expected Found, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn literal_chars_special_to_regex_are_escaped() -> anyhow::Result<()> {
        let mut registry = RouteRegistry::new();
        registry.add_route(&[Method::GET], "/v1.0/read(me)", "dotted", &no_overrides())?;
        let dispatcher = Dispatcher::compile(&registry)?;
        assert_eq!(
            found_handler(&dispatcher.dispatch(&Method::GET, "/v1.0/read(me)")),
            Some("dotted")
        );
        // The dot must not behave as a regex wildcard.
        assert!(matches!(
            dispatcher.dispatch(&Method::GET, "/v1X0/read(me)"),
            DispatchOutcome::NotFound
        ));
        Ok(())
    }
}
