/// Caller-supplied configuration, consumed once by
/// [`QueryHandler::new`](crate::QueryHandler::new).
///
/// Construct with struct-update syntax over the defaults:
///
/// ```
/// use query_sieve::Config;
///
/// let config = Config {
///     allowed_fields: Some(vec!["name".into(), "email".into()]),
///     validate_returned_fields: true,
///     ..Config::default()
/// };
/// assert_eq!(config.offset_name, "page");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Interpret the offset value as a 1-based page number
    /// (`skip = limit * (page - 1)`) instead of a raw skip count.
    pub user_friendly_paging: bool,
    pub offset_name: String,
    pub limit_name: String,
    /// Filter the `fields` projection against the allow set.
    pub validate_returned_fields: bool,
    /// Top-level fields accepted in filters and projections. `None` allows
    /// everything.
    pub allowed_fields: Option<Vec<String>>,
    /// Projection used when the query names none.
    pub default_fields: Option<Vec<String>>,
    pub populate_suffix: String,
    /// Fields eligible for population, with their own nested field rules.
    pub populate_fields: Vec<(String, PopulateSpec)>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            user_friendly_paging: true,
            offset_name: "page".to_string(),
            limit_name: "per_page".to_string(),
            validate_returned_fields: false,
            allowed_fields: None,
            default_fields: None,
            populate_suffix: "-populate".to_string(),
            populate_fields: Vec::new(),
        }
    }
}

/// Nested field rules for one population-eligible field. The default value
/// is the wildcard rule: any requested field passes through.
#[derive(Debug, Clone, Default)]
pub struct PopulateSpec {
    pub allowed_fields: Option<Vec<String>>,
    pub default_fields: Option<Vec<String>>,
}

/// A resolved population rule, keyed by the suffixed lookup name.
#[derive(Debug, Clone)]
pub(crate) struct PopulateRule {
    pub allowed: Option<Vec<String>>,
    pub defaults: Option<Vec<String>>,
}

/// The lookup tables the handler works from, built once from [`Config`] and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub user_friendly_paging: bool,
    pub offset_name: String,
    pub limit_name: String,
    pub validate_returned_fields: bool,
    pub allowed: Option<Vec<String>>,
    /// Space-joined default projection.
    pub default_fields: Option<String>,
    pub populate_suffix: String,
    pub populate: Vec<(String, PopulateRule)>,
}

impl ResolvedConfig {
    pub fn resolve(config: Config) -> Self {
        let allowed = config.allowed_fields.filter(|fields| !fields.is_empty());

        let defaults = match (&allowed, config.default_fields) {
            // Both given: keep allowed order, restricted to the defaults.
            (Some(allowed), Some(defaults)) => Some(
                allowed
                    .iter()
                    .filter(|field| defaults.contains(field))
                    .cloned()
                    .collect::<Vec<_>>(),
            ),
            (Some(allowed), None) => Some(allowed.clone()),
            (None, Some(defaults)) => Some(defaults),
            (None, None) => None,
        };

        let mut populate = Vec::new();
        for (field, spec) in config.populate_fields {
            // A population rule only takes effect for fields the top-level
            // allow set admits.
            let eligible = allowed
                .as_ref()
                .is_none_or(|allowed| allowed.contains(&field));
            if !eligible {
                continue;
            }

            let defaults = match &spec.allowed_fields {
                None => spec.default_fields,
                Some(rule_allowed) => Some(match spec.default_fields {
                    Some(given) => given
                        .into_iter()
                        .filter(|field| rule_allowed.contains(field))
                        .collect(),
                    None => rule_allowed.clone(),
                }),
            };

            populate.push((
                format!("{}{}", field, config.populate_suffix),
                PopulateRule {
                    allowed: spec.allowed_fields,
                    defaults,
                },
            ));
        }

        ResolvedConfig {
            user_friendly_paging: config.user_friendly_paging,
            offset_name: config.offset_name,
            limit_name: config.limit_name,
            validate_returned_fields: config.validate_returned_fields,
            allowed,
            default_fields: defaults.map(|fields| fields.join(" ")),
            populate_suffix: config.populate_suffix,
            populate,
        }
    }

    pub fn field_allowed(&self, name: &str) -> bool {
        self.allowed
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|field| field == name))
    }

    pub fn rule(&self, suffixed_key: &str) -> Option<&PopulateRule> {
        self.populate
            .iter()
            .find(|(key, _)| key == suffixed_key)
            .map(|(_, rule)| rule)
    }
}
