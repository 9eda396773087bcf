//! The typed filter state and its URL query-string codec.
//!
//! Encoding omits every default-valued key so that shared URLs stay minimal;
//! decoding is tolerant and passes keys it does not own through unchanged.

use time::OffsetDateTime;

use crate::period::{ALL_TOKENS, PeriodToken, ResolvedRange, resolve};

/// Per-page configuration of the filter subsystem.
///
/// Each page (dashboard, leads, sales) repeats the same filter machinery with
/// a different default period, accepted period subset, and lead-source key
/// spelling. The schema captures that variation in one place.
#[derive(Debug, Clone, Copy)]
pub struct FilterSchema {
    /// The period used when the query carries none, or an invalid one.
    pub default_period: PeriodToken,
    /// The period tokens this page accepts.
    pub accepted_periods: &'static [PeriodToken],
    /// The query key used for the lead-source filter (`source` or `leadSource`).
    pub source_key: &'static str,
}

impl FilterSchema {
    /// The dashboard page: month-to-date by default, no "last …" presets.
    pub fn dashboard() -> Self {
        Self {
            default_period: PeriodToken::Month,
            accepted_periods: &[
                PeriodToken::AllTime,
                PeriodToken::Today,
                PeriodToken::Yesterday,
                PeriodToken::Week,
                PeriodToken::Month,
                PeriodToken::Quarter,
                PeriodToken::Year,
                PeriodToken::Custom,
            ],
            source_key: "source",
        }
    }

    /// The leads page: unfiltered by default, every preset available.
    pub fn leads() -> Self {
        Self {
            default_period: PeriodToken::AllTime,
            accepted_periods: ALL_TOKENS,
            source_key: "leadSource",
        }
    }

    /// The sales page: month-to-date by default, full preset set minus
    /// `allTime` (sales reports are always windowed).
    pub fn sales() -> Self {
        Self {
            default_period: PeriodToken::Month,
            accepted_periods: &[
                PeriodToken::Today,
                PeriodToken::Yesterday,
                PeriodToken::Week,
                PeriodToken::LastWeek,
                PeriodToken::Month,
                PeriodToken::LastMonth,
                PeriodToken::Quarter,
                PeriodToken::LastQuarter,
                PeriodToken::Year,
                PeriodToken::Custom,
            ],
            source_key: "source",
        }
    }
}

/// The filter fields this subsystem owns, addressable for staging and
/// chip-removal operations.
///
/// [FilterKey::Period] covers the period token together with its custom
/// `from`/`to` bounds, which only mean anything alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterKey {
    /// Period token plus custom date bounds.
    Period,
    /// Multi-select lead status.
    Status,
    /// Multi-select owner.
    Owner,
    /// Multi-select lead source.
    Source,
    /// Free-text search.
    Search,
}

impl FilterKey {
    /// Every owned field, used by clear-all.
    pub const ALL: &'static [FilterKey] = &[
        FilterKey::Period,
        FilterKey::Status,
        FilterKey::Owner,
        FilterKey::Source,
        FilterKey::Search,
    ];
}

/// The decoded filter state for one page.
///
/// `None`/empty values mean "use the default" and are never serialized.
/// Query keys this subsystem does not own (pagination's `page`/`limit`,
/// theme toggles, …) ride along in `extra` and re-emit unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// The selected period token; `None` means the schema default.
    pub period: Option<PeriodToken>,
    /// Custom range lower bound, raw as it appeared in the URL.
    pub custom_from: Option<String>,
    /// Custom range upper bound, raw as it appeared in the URL.
    pub custom_to: Option<String>,
    /// Selected status values.
    pub status: Vec<String>,
    /// Selected owner IDs.
    pub owner: Vec<String>,
    /// Selected lead sources.
    pub source: Vec<String>,
    /// Free-text search term.
    pub search: Option<String>,
    /// Unowned query pairs, preserved in first-seen order.
    pub extra: Vec<(String, String)>,
}

impl FilterState {
    /// The effective period token after applying the schema default.
    ///
    /// A token outside the schema's accepted subset also falls back to the
    /// default; states built from a decoded query never hit that path, but
    /// hand-built ones can.
    pub fn period_or_default(&self, schema: &FilterSchema) -> PeriodToken {
        match self.period {
            Some(token) if schema.accepted_periods.contains(&token) => token,
            Some(token) => {
                tracing::warn!(
                    "period token {:?} is not accepted here, falling back to {:?}",
                    token,
                    schema.default_period
                );
                schema.default_period
            }
            None => schema.default_period,
        }
    }

    /// Resolve this state's period into concrete date bounds.
    pub fn resolve_period(&self, schema: &FilterSchema, now: OffsetDateTime) -> ResolvedRange {
        resolve(
            self.period_or_default(schema),
            now,
            self.custom_from.as_deref(),
            self.custom_to.as_deref(),
        )
    }

    /// Copy one owned field's value from another state.
    pub fn copy_field(&mut self, key: FilterKey, source: &FilterState) {
        match key {
            FilterKey::Period => {
                self.period = source.period;
                self.custom_from = source.custom_from.clone();
                self.custom_to = source.custom_to.clone();
            }
            FilterKey::Status => self.status = source.status.clone(),
            FilterKey::Owner => self.owner = source.owner.clone(),
            FilterKey::Source => self.source = source.source.clone(),
            FilterKey::Search => self.search = source.search.clone(),
        }
    }

    /// Reset one owned field to its default.
    pub fn clear_field(&mut self, key: FilterKey) {
        match key {
            FilterKey::Period => {
                self.period = None;
                self.custom_from = None;
                self.custom_to = None;
            }
            FilterKey::Status => self.status.clear(),
            FilterKey::Owner => self.owner.clear(),
            FilterKey::Source => self.source.clear(),
            FilterKey::Search => self.search = None,
        }
    }
}

/// Decode a query string (with or without a leading `?`) into filter state.
///
/// Decoding never fails: an unparsable query decodes to the default state,
/// unknown period tokens fall back to the schema default, and empty
/// multi-value segments are dropped.
pub fn decode(query: &str, schema: &FilterSchema) -> FilterState {
    let query = query.trim_start_matches('?');
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
        Ok(pairs) => pairs,
        Err(error) => {
            tracing::warn!("unparsable query string {query:?}: {error}");
            Vec::new()
        }
    };

    let mut state = FilterState::default();

    for (key, value) in pairs {
        if key == schema.source_key {
            state.source = split_list(&value);
            continue;
        }

        match key.as_str() {
            "period" => state.period = decode_period(&value, schema),
            "from" => state.custom_from = non_empty(value),
            "to" => state.custom_to = non_empty(value),
            "status" => state.status = split_list(&value),
            "owner" => state.owner = split_list(&value),
            "search" => state.search = non_empty(value),
            _ => state.extra.push((key, value)),
        }
    }

    state
}

/// Encode filter state as a query string fragment (no leading `?`).
///
/// Owned keys come first in canonical order, then unowned pairs in their
/// original order. Keys at their default value are omitted entirely; that
/// omission is the round-trip contract that keeps URLs shareable.
pub fn encode(state: &FilterState, schema: &FilterSchema) -> String {
    pairs_to_query(&encode_pairs(state, schema))
}

/// Serialize a pair list as a query string fragment.
pub(crate) fn pairs_to_query(pairs: &[(String, String)]) -> String {
    let encoded = serde_urlencoded::to_string(pairs).expect("invalid query pairs");

    // Commas only ever appear as list separators, keep them readable.
    encoded.replace("%2C", ",")
}

/// The owned-then-extra pair list behind [encode], shared with the list and
/// export query builders.
pub(crate) fn encode_pairs(state: &FilterState, schema: &FilterSchema) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if let Some(token) = state.period {
        if token != schema.default_period {
            pairs.push(("period".to_owned(), token.as_query_value().to_owned()));
        }
    }

    if let Some(from) = &state.custom_from {
        pairs.push(("from".to_owned(), from.clone()));
    }

    if let Some(to) = &state.custom_to {
        pairs.push(("to".to_owned(), to.clone()));
    }

    if !state.status.is_empty() {
        pairs.push(("status".to_owned(), state.status.join(",")));
    }

    if !state.owner.is_empty() {
        pairs.push(("owner".to_owned(), state.owner.join(",")));
    }

    if !state.source.is_empty() {
        pairs.push((schema.source_key.to_owned(), state.source.join(",")));
    }

    if let Some(search) = &state.search {
        pairs.push(("search".to_owned(), search.clone()));
    }

    pairs.extend(state.extra.iter().cloned());

    pairs
}

fn decode_period(raw: &str, schema: &FilterSchema) -> Option<PeriodToken> {
    match PeriodToken::from_query_value(raw) {
        Some(token) if schema.accepted_periods.contains(&token) => Some(token),
        Some(token) => {
            tracing::warn!(
                "period token {:?} is not accepted here, falling back to {:?}",
                token,
                schema.default_period
            );
            None
        }
        None => {
            if !raw.is_empty() {
                tracing::warn!(
                    "unknown period token {raw:?}, falling back to {:?}",
                    schema.default_period
                );
            }
            None
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::period::PeriodToken;

    use super::{FilterKey, FilterSchema, FilterState, decode, encode};

    #[test]
    fn default_state_encodes_to_an_empty_query() {
        let schema = FilterSchema::leads();

        let got = encode(&FilterState::default(), &schema);

        assert_eq!(got, "");
    }

    #[test]
    fn default_period_is_omitted() {
        let schema = FilterSchema::dashboard();
        let state = FilterState {
            period: Some(PeriodToken::Month),
            ..Default::default()
        };

        assert_eq!(encode(&state, &schema), "");
    }

    #[test]
    fn multi_values_encode_as_one_comma_joined_parameter() {
        let schema = FilterSchema::leads();
        let state = FilterState {
            status: vec!["new".to_owned(), "contacted".to_owned()],
            ..Default::default()
        };

        assert_eq!(encode(&state, &schema), "status=new,contacted");
    }

    #[test]
    fn round_trip_preserves_non_default_state_and_unowned_keys() {
        let schema = FilterSchema::leads();
        let query = "status=new,contacted&owner=user-1&page=2&limit=50";

        let got = encode(&decode(query, &schema), &schema);

        assert_eq!(got, query);
    }

    #[test]
    fn decode_splits_multi_values_and_drops_empty_segments() {
        let schema = FilterSchema::leads();

        let got = decode("status=new,,contacted,", &schema);

        assert_eq!(got.status, vec!["new".to_owned(), "contacted".to_owned()]);
    }

    #[test]
    fn empty_parameter_decodes_to_empty_set_and_vanishes_on_encode() {
        let schema = FilterSchema::leads();

        let state = decode("status=&owner=user-1", &schema);

        assert!(state.status.is_empty());
        assert_eq!(encode(&state, &schema), "owner=user-1");
    }

    #[test]
    fn percent_escapes_and_plus_decode_transparently() {
        let schema = FilterSchema::leads();

        let state = decode("search=new+york%21", &schema);

        assert_eq!(state.search.as_deref(), Some("new york!"));
        assert_eq!(encode(&state, &schema), "search=new+york%21");
    }

    #[test]
    fn unknown_period_token_falls_back_to_the_default() {
        let schema = FilterSchema::dashboard();

        let state = decode("period=bogus", &schema);

        assert_eq!(state.period, None);
        assert_eq!(state.period_or_default(&schema), PeriodToken::Month);
    }

    #[test]
    fn out_of_subset_period_token_falls_back_to_the_default() {
        // The dashboard page does not offer lastMonth.
        let schema = FilterSchema::dashboard();

        let state = decode("period=lastMonth", &schema);

        assert_eq!(state.period, None);
        assert_eq!(state.period_or_default(&schema), PeriodToken::Month);
    }

    #[test]
    fn leads_schema_uses_the_lead_source_key() {
        let schema = FilterSchema::leads();
        let state = decode("leadSource=web,referral", &schema);

        assert_eq!(state.source, vec!["web".to_owned(), "referral".to_owned()]);
        assert_eq!(encode(&state, &schema), "leadSource=web,referral");
    }

    #[test]
    fn plain_source_key_is_unowned_on_the_leads_page() {
        let schema = FilterSchema::leads();

        let state = decode("source=web", &schema);

        assert!(state.source.is_empty());
        assert_eq!(state.extra, vec![("source".to_owned(), "web".to_owned())]);
    }

    #[test]
    fn resolve_period_uses_custom_bounds() {
        let schema = FilterSchema::leads();
        let state = decode("period=custom&from=2026-01-01&to=2026-01-31", &schema);

        let got = state.resolve_period(&schema, datetime!(2026-08-25 12:00 UTC));

        assert_eq!(got.date_from.as_deref(), Some("2026-01-01T00:00:00.000Z"));
        assert_eq!(got.date_to.as_deref(), Some("2026-01-31T23:59:59.999Z"));
    }

    #[test]
    fn clear_field_resets_period_and_custom_bounds_together() {
        let schema = FilterSchema::leads();
        let mut state = decode("period=custom&from=2026-01-01&to=2026-01-31", &schema);

        state.clear_field(FilterKey::Period);

        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn copy_field_moves_a_single_field_between_states() {
        let schema = FilterSchema::leads();
        let source = decode("status=new&owner=user-1", &schema);
        let mut target = FilterState::default();

        target.copy_field(FilterKey::Status, &source);

        assert_eq!(target.status, vec!["new".to_owned()]);
        assert!(target.owner.is_empty());
    }

    #[test]
    fn invalid_percent_sequences_pass_through_literally() {
        let schema = FilterSchema::leads();

        let got = decode("status=%zz", &schema);

        assert_eq!(got.status, vec!["%zz".to_owned()]);
    }
}
