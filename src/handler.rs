use crate::config::{Config, ResolvedConfig};
use crate::fragment::Fragment;
use crate::interpret::{Diagnostic, interpret};
use crate::value::Value;

/// Paging and sort portion of a descriptor. `sort` keeps the requested
/// field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSort {
    pub sort: Vec<(String, i64)>,
    pub skip: u64,
    pub limit: u64,
}

/// The normalized query descriptor handed to the data-store driver.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    /// Space-joined projection, `None` when neither the query nor the
    /// configuration names one.
    pub fields: Option<String>,
    /// The filter fragment tree.
    pub opts: Fragment,
    pub page_sort: PageSort,
    /// Population requests: suffixed key to space-joined field list.
    pub populate: Vec<(String, String)>,
    /// Everything that was dropped or repaired along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl QueryDescriptor {
    pub fn populated(&self, suffixed_key: &str) -> Option<&str> {
        self.populate
            .iter()
            .find(|(key, _)| key == suffixed_key)
            .map(|(_, fields)| fields.as_str())
    }
}

/// Interprets incoming queries against a fixed configuration.
///
/// Construction resolves the configuration once; the handler is read-only
/// afterwards and can be shared across threads freely. Each call builds a
/// fresh descriptor.
///
/// # Examples
///
/// ```
/// use query_sieve::{Config, QueryHandler};
///
/// let handler = QueryHandler::new(Config::default());
/// let result = handler.handle_str("fields=name,email&page=2&per_page=10");
/// assert_eq!(result.fields.as_deref(), Some("name email"));
/// assert_eq!(result.page_sort.skip, 10);
/// assert_eq!(result.page_sort.limit, 10);
/// ```
#[derive(Debug, Clone)]
pub struct QueryHandler {
    config: ResolvedConfig,
}

impl QueryHandler {
    pub fn new(config: Config) -> Self {
        QueryHandler {
            config: ResolvedConfig::resolve(config),
        }
    }

    /// Handles a raw query string. A leading fragment through the first `?`
    /// is stripped, components are percent-decoded, and `&`/`=` splitting
    /// yields the key/value pairs; a key with no `=` carries no value.
    pub fn handle_str(&self, raw: &str) -> QueryDescriptor {
        let pairs = split_query_string(raw);
        let borrowed: Vec<(&str, Option<&str>)> = pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
            .collect();
        self.handle_pairs(&borrowed)
    }

    /// Handles a pre-split query: one `(key, value)` pair per parameter, in
    /// request order. A `None` value stands for a key given without one.
    pub fn handle_pairs(&self, pairs: &[(&str, Option<&str>)]) -> QueryDescriptor {
        let mut descriptor = QueryDescriptor {
            fields: self.config.default_fields.clone(),
            opts: Fragment::new(),
            page_sort: PageSort::default(),
            populate: Vec::new(),
            diagnostics: Vec::new(),
        };

        for (key, value) in pairs {
            if self.is_populate_key(key) {
                self.apply_populate(key, *value, &mut descriptor);
                continue;
            }

            match *key {
                "fields" => self.apply_fields(*value, &mut descriptor),
                "sort" => apply_sort(*value, &mut descriptor),
                "$or" | "$and" | "$nor" => apply_combinator(key, *value, &mut descriptor),
                offset if offset == self.config.offset_name => {
                    self.apply_pagination(pairs, &mut descriptor);
                }
                // Consumed together with the offset key.
                limit if limit == self.config.limit_name => {}
                field => self.apply_filter(field, *value, &mut descriptor),
            }
        }

        descriptor
    }

    /// Computes `(skip, limit)` for one page under the configured paging
    /// mode. In the user-friendly mode `page` is 1-based.
    pub fn calculate_pagination(&self, per_page: u64, page: u64) -> (u64, u64) {
        if self.config.user_friendly_paging {
            (per_page.saturating_mul(page.saturating_sub(1)), per_page)
        } else {
            (page, per_page)
        }
    }

    fn is_populate_key(&self, key: &str) -> bool {
        key.len() > self.config.populate_suffix.len()
            && key.ends_with(&self.config.populate_suffix)
    }

    fn apply_fields(&self, value: Option<&str>, descriptor: &mut QueryDescriptor) {
        let Some(value) = value else { return };

        if self.config.validate_returned_fields && self.config.allowed.is_some() {
            let kept: Vec<&str> = value
                .split(',')
                .filter(|field| self.config.field_allowed(field))
                .collect();
            descriptor.fields = Some(kept.join(" "));
        } else {
            descriptor.fields = Some(value.replace(',', " "));
        }
    }

    fn apply_pagination(&self, pairs: &[(&str, Option<&str>)], descriptor: &mut QueryDescriptor) {
        let lookup = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .and_then(|(_, value)| *value)
        };

        let limit = lookup(&self.config.limit_name)
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(0);
        let offset = lookup(&self.config.offset_name).and_then(|raw| raw.parse::<u64>().ok());

        let (skip, limit) = if self.config.user_friendly_paging {
            self.calculate_pagination(limit, offset.unwrap_or(1))
        } else {
            self.calculate_pagination(limit, offset.unwrap_or(0))
        };
        descriptor.page_sort.skip = skip;
        descriptor.page_sort.limit = limit;
    }

    fn apply_populate(&self, key: &str, value: Option<&str>, descriptor: &mut QueryDescriptor) {
        // A suffixed key without a resolved rule is dropped outright.
        let Some(rule) = self.config.rule(key) else {
            return;
        };

        match (value, &rule.allowed) {
            (Some(requested), Some(allowed)) => {
                let kept: Vec<&str> = requested
                    .split(',')
                    .filter(|field| allowed.iter().any(|a| a == field))
                    .collect();
                descriptor.populate.push((key.to_string(), kept.join(" ")));
            }
            (Some(requested), None) => {
                let fields: Vec<&str> = requested.split(',').collect();
                descriptor.populate.push((key.to_string(), fields.join(" ")));
            }
            (None, _) => {
                if let Some(defaults) = &rule.defaults {
                    descriptor
                        .populate
                        .push((key.to_string(), defaults.join(" ")));
                }
            }
        }
    }

    fn apply_filter(&self, field: &str, value: Option<&str>, descriptor: &mut QueryDescriptor) {
        if !self.config.field_allowed(field) {
            return;
        }
        let Some(value) = value else { return };

        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() > 1 {
            let result = interpret(&parts);
            descriptor.diagnostics.extend(result.diagnostics.clone());
            descriptor
                .opts
                .insert(field, Value::Fragment(result.into_fragment()));
        } else {
            descriptor
                .opts
                .insert(field, Value::String(parts[0].to_string()));
        }
    }
}

fn apply_combinator(key: &str, value: Option<&str>, descriptor: &mut QueryDescriptor) {
    let Some(value) = value else { return };

    // The combinator key becomes token 0; the comma-split value already
    // starts with the caller-declared operand count.
    let mut tokens = vec![key];
    tokens.extend(value.split(','));

    let result = interpret(&tokens);
    descriptor.diagnostics.extend(result.diagnostics);
    for (key, value) in result.conditions {
        descriptor.opts.insert(key, value);
    }
}

fn apply_sort(value: Option<&str>, descriptor: &mut QueryDescriptor) {
    let Some(value) = value else { return };

    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() < 2 {
        return;
    }

    for pair in parts.chunks(2) {
        let [field, direction] = pair else { continue };
        match direction.parse::<i64>() {
            Ok(direction) => descriptor
                .page_sort
                .sort
                .push((field.to_string(), direction)),
            Err(_) => descriptor.diagnostics.push(Diagnostic::InvalidSortDirection {
                field: field.to_string(),
                raw: direction.to_string(),
            }),
        }
    }
}

fn split_query_string(raw: &str) -> Vec<(String, Option<String>)> {
    let raw = match raw.find('?') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    };

    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (percent_decode(key), Some(percent_decode(value))),
            None => (percent_decode(pair), None),
        })
        .collect()
}

/// Decodes `%XX` escapes; anything malformed passes through untouched. `+`
/// is deliberately left alone.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
