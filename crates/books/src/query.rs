use serde::{Deserialize, Serialize};

/// Filters for a book search. Every field is optional; a missing, empty
/// or blank value does not constrain the search.
///
/// The serialized names are the ones the model uses when it calls the
/// search tool, which are also the keyword prefixes of the remote API.
/// With the `schemars` feature the type also describes itself as the
/// parameter schema of that tool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct SearchParameters {
    /// Free text, sent without a keyword prefix.
    #[cfg_attr(
        feature = "schemars",
        schemars(description = "General search query for books")
    )]
    #[serde(
        rename = "query",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub free_text: Option<String>,
    /// Words in the title.
    #[cfg_attr(
        feature = "schemars",
        schemars(description = "Search for books with this title")
    )]
    #[serde(
        rename = "intitle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    /// Words in the author name.
    #[cfg_attr(
        feature = "schemars",
        schemars(description = "Search for books by this author")
    )]
    #[serde(
        rename = "inauthor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<String>,
    /// Words in the publisher name.
    #[cfg_attr(
        feature = "schemars",
        schemars(description = "Search for books by this publisher")
    )]
    #[serde(
        rename = "inpublisher",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub publisher: Option<String>,
    /// Subject or category.
    #[cfg_attr(
        feature = "schemars",
        schemars(description = "Search for books in this subject/category")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// ISBN-10 or ISBN-13.
    #[cfg_attr(
        feature = "schemars",
        schemars(description = "Search for books by ISBN")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Library of Congress Control Number.
    #[cfg_attr(
        feature = "schemars",
        schemars(
            description = "Search for books by Library of Congress Control \
                           Number"
        )
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lccn: Option<String>,
    /// OCLC number.
    #[cfg_attr(
        feature = "schemars",
        schemars(description = "Search for books by OCLC number")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oclc: Option<String>,
}

impl SearchParameters {
    /// Returns the present values with their keyword prefix, in the fixed
    /// order free text, title, author, publisher, subject, isbn, lccn,
    /// oclc. Values are trimmed.
    pub fn fields(&self) -> impl Iterator<Item = (Option<&'static str>, &str)> {
        [
            (None, &self.free_text),
            (Some("intitle"), &self.title),
            (Some("inauthor"), &self.author),
            (Some("inpublisher"), &self.publisher),
            (Some("subject"), &self.subject),
            (Some("isbn"), &self.isbn),
            (Some("lccn"), &self.lccn),
            (Some("oclc"), &self.oclc),
        ]
        .into_iter()
        .filter_map(|(prefix, value)| {
            let value = value.as_deref()?.trim();
            (!value.is_empty()).then_some((prefix, value))
        })
    }

    /// Returns `true` if no field constrains the search.
    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Builds the `q` parameter: each present field becomes
    /// `prefix:value` with the value percent-encoded on its own, and the
    /// fragments are joined with `+`.
    pub fn query_string(&self) -> String {
        self.fields()
            .map(|(prefix, value)| {
                let value = urlencoding::encode(value);
                match prefix {
                    Some(prefix) => format!("{prefix}:{value}"),
                    None => value.into_owned(),
                }
            })
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Joins the raw values with `+`, for telling the user what is being
    /// searched.
    pub fn summary(&self) -> String {
        self.fields()
            .map(|(_, value)| value)
            .collect::<Vec<_>>()
            .join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_field() {
        let params = SearchParameters {
            author: Some("Agatha Christie".to_owned()),
            ..Default::default()
        };
        assert_eq!(params.query_string(), "inauthor:Agatha%20Christie");

        let params = SearchParameters {
            isbn: Some("9780062073488".to_owned()),
            ..Default::default()
        };
        assert_eq!(params.query_string(), "isbn:9780062073488");
    }

    #[test]
    fn test_free_text_has_no_prefix() {
        let params = SearchParameters {
            free_text: Some("murder on the orient express".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            params.query_string(),
            "murder%20on%20the%20orient%20express"
        );
    }

    #[test]
    fn test_fixed_order_and_encoding() {
        let params = SearchParameters {
            oclc: Some("12345".to_owned()),
            subject: Some("Science Fiction".to_owned()),
            title: Some("Dune & Sons".to_owned()),
            free_text: Some("classic".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            params.query_string(),
            "classic+intitle:Dune%20%26%20Sons+subject:Science%20Fiction\
             +oclc:12345"
        );
        assert_eq!(
            params.summary(),
            "classic+Dune & Sons+Science Fiction+12345"
        );
    }

    #[test]
    fn test_empty_and_blank_fields_are_dropped() {
        assert!(SearchParameters::default().is_empty());
        assert_eq!(SearchParameters::default().query_string(), "");

        let params = SearchParameters {
            title: Some("   ".to_owned()),
            publisher: Some(String::new()),
            lccn: Some(" 2001012345 ".to_owned()),
            ..Default::default()
        };
        assert!(!params.is_empty());
        assert_eq!(params.query_string(), "lccn:2001012345");
    }

    #[test]
    fn test_deserialize_tool_names() {
        let params: SearchParameters = serde_json::from_str(
            r#"{"inauthor": "Ursula K. Le Guin", "inpublisher": null}"#,
        )
        .unwrap();
        assert_eq!(params.author.as_deref(), Some("Ursula K. Le Guin"));
        assert_eq!(params.publisher, None);
        assert_eq!(params.query_string(), "inauthor:Ursula%20K.%20Le%20Guin");
    }
}
