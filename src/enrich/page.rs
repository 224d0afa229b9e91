// file: src/enrich/page.rs
// description: tolerant field extraction from a LinkedIn company page snapshot
// reference: selector-based parsing with regex fallbacks

use crate::error::FetchError;
use crate::models::{CanonicalField, FetchedFields};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

lazy_static! {
    static ref SIZE_SELECTOR: Selector =
        Selector::parse("div[data-test-id='about-us__size'] dd").expect("valid selector");
    static ref INDUSTRY_SELECTOR: Selector =
        Selector::parse("div[data-test-id='about-us__industry'] dd").expect("valid selector");
    static ref WEBSITE_SELECTOR: Selector =
        Selector::parse("div[data-test-id='about-us__website'] dd a").expect("valid selector");
    static ref DESCRIPTION_SELECTOR: Selector =
        Selector::parse("p[data-test-id='about-us__description']").expect("valid selector");
    static ref OG_DESCRIPTION_SELECTOR: Selector =
        Selector::parse("meta[property='og:description']").expect("valid selector");
    static ref SIZE_PATTERN: Regex =
        Regex::new(r"(?i)([\d,]+(?:\s*-\s*[\d,]+)?|[\d,]+\+)\s+employees").expect("valid regex");
    static ref REVENUE_PATTERN: Regex =
        Regex::new(r"(?i)revenue[^$€£\d]{0,40}([$€£][\d.,]+\s?(?:[KMB]|million|billion)?)")
            .expect("valid regex");
}

/// Extract company fields from a fetched page body.
///
/// A page that parses but yields none of the expected fields is treated as
/// transient: the usual cause is an interstitial or a layout change, and a
/// later attempt may land on the real page.
pub fn extract_company_fields(body: &str) -> Result<FetchedFields, FetchError> {
    let document = Html::parse_document(body);
    let mut fields = FetchedFields::new();

    if let Some(size) = select_text(&document, &SIZE_SELECTOR)
        .map(|text| strip_employees_suffix(&text))
        .or_else(|| size_from_text(body))
    {
        fields.insert(CanonicalField::Size, size);
    }

    if let Some(industry) = select_text(&document, &INDUSTRY_SELECTOR) {
        fields.insert(CanonicalField::Industry, industry);
    }

    if let Some(website) = document
        .select(&WEBSITE_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href").map(str::to_string))
        .filter(|href| !href.trim().is_empty())
    {
        fields.insert(CanonicalField::Website, website.trim().to_string());
    }

    if let Some(description) = select_text(&document, &DESCRIPTION_SELECTOR)
        .or_else(|| meta_content(&document, &OG_DESCRIPTION_SELECTOR))
    {
        fields.insert(CanonicalField::Description, description);
    }

    if let Some(revenue) = REVENUE_PATTERN
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
    {
        fields.insert(CanonicalField::Revenue, revenue);
    }

    if fields.is_empty() {
        return Err(FetchError::Transient(
            "page contained no recognizable company data".to_string(),
        ));
    }

    Ok(fields)
}

fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    let element = document.select(selector).next()?;
    let text = element.text().collect::<Vec<_>>().join(" ");
    let text = normalize_whitespace(&text);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(normalize_whitespace)
        .filter(|content| !content.is_empty())
}

fn size_from_text(body: &str) -> Option<String> {
    SIZE_PATTERN
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| normalize_whitespace(m.as_str()))
}

fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_employees_suffix(value: &str) -> String {
    value
        .strip_suffix(" employees")
        .unwrap_or(value)
        .to_string()
}
