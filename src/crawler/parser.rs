//! Listing parser for search-result pages
//!
//! Each result page carries one `.item_recruit` block per job posting. Every
//! field of a block is pulled out by its own extractor, so a block that lacks
//! an element only loses that field (it becomes an empty string) instead of
//! failing as a whole. Only the fields needed to store a posting at all, the
//! link and the company name, reject a block when missing.

use crate::crawler::ListingError;
use crate::model::NewJob;
use crate::CrawlError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One job posting as extracted from a listing block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedListing {
    pub company: String,
    pub title: String,
    /// Absolute URL of the posting's detail page
    pub link: String,
    pub location: String,
    pub experience: String,
    pub education: String,
    pub employment_type: String,
    pub deadline: String,
    pub sector: String,
    pub salary: String,
    pub skills: Vec<String>,
}

impl ParsedListing {
    /// Builds the job row for this listing under the resolved company
    pub fn to_new_job(&self, company_id: i64) -> NewJob {
        NewJob {
            company_id,
            title: self.title.clone(),
            link: self.link.clone(),
            location: self.location.clone(),
            experience: self.experience.clone(),
            education: self.education.clone(),
            employment_type: self.employment_type.clone(),
            deadline: self.deadline.clone(),
            sector: self.sector.clone(),
            salary: self.salary.clone(),
            skills: self.skills.clone(),
        }
    }
}

/// Compiled selectors for the listing markup
pub struct ListingParser {
    block: Selector,
    company: Selector,
    title: Selector,
    conditions: Selector,
    deadline: Selector,
    sector: Selector,
    badges: Selector,
    skills: Selector,
}

impl ListingParser {
    /// Compiles the listing selectors
    pub fn new() -> Result<Self, CrawlError> {
        Ok(Self {
            block: selector(".item_recruit")?,
            company: selector(".corp_name a")?,
            title: selector(".job_tit a")?,
            conditions: selector(".job_condition span")?,
            deadline: selector(".job_date .date")?,
            sector: selector(".job_sector")?,
            badges: selector(".area_badge .badge")?,
            skills: selector(".job_sector a")?,
        })
    }

    /// Parses every listing block on a result page, in document order
    ///
    /// An empty vector means the page has no listings at all, which callers
    /// treat as the end of the results.
    ///
    /// # Example
    ///
    /// ```
    /// use saramin_crawler::crawler::ListingParser;
    /// use url::Url;
    ///
    /// let html = r#"<div class="item_recruit">
    ///     <div class="corp_name"><a>Acme</a></div>
    ///     <h2 class="job_tit"><a href="/jobs/1">Backend Engineer</a></h2>
    /// </div>"#;
    /// let parser = ListingParser::new().unwrap();
    /// let base = Url::parse("https://jobs.example.com/search").unwrap();
    /// let listings = parser.parse_page(html, &base);
    /// assert_eq!(listings.len(), 1);
    /// assert_eq!(listings[0].as_ref().unwrap().link, "https://jobs.example.com/jobs/1");
    /// ```
    pub fn parse_page(&self, html: &str, page_url: &Url) -> Vec<Result<ParsedListing, ListingError>> {
        let document = Html::parse_document(html);

        document
            .select(&self.block)
            .map(|block| self.parse_listing(block, page_url))
            .collect()
    }

    /// Parses a single listing block
    fn parse_listing(
        &self,
        block: ElementRef<'_>,
        page_url: &Url,
    ) -> Result<ParsedListing, ListingError> {
        let title = self.extract_title(block);

        // Link and company are required; everything else may be empty
        let link = self
            .extract_link(block, page_url)
            .ok_or_else(|| ListingError::MissingField {
                field: "link",
                title: title.clone(),
            })?;

        let company = self.extract_company(block);
        if company.is_empty() {
            return Err(ListingError::MissingField {
                field: "company",
                title,
            });
        }

        Ok(ParsedListing {
            company,
            title,
            link,
            location: self.extract_condition(block, 0, "location"),
            experience: self.extract_condition(block, 1, "experience"),
            education: self.extract_condition(block, 2, "education"),
            employment_type: self.extract_condition(block, 3, "employment type"),
            deadline: self.extract_deadline(block),
            sector: self.extract_sector(block),
            salary: self.extract_salary(block),
            skills: self.extract_skills(block),
        })
    }

    fn extract_company(&self, block: ElementRef<'_>) -> String {
        first_text(block, &self.company).unwrap_or_else(|| missing("company"))
    }

    fn extract_title(&self, block: ElementRef<'_>) -> String {
        first_text(block, &self.title).unwrap_or_else(|| missing("title"))
    }

    fn extract_link(&self, block: ElementRef<'_>, page_url: &Url) -> Option<String> {
        block
            .select(&self.title)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
            .and_then(|href| resolve_link(href, page_url))
    }

    /// Location, experience, education and employment type are the first four
    /// condition spans, in that order
    fn extract_condition(&self, block: ElementRef<'_>, index: usize, field: &str) -> String {
        block
            .select(&self.conditions)
            .nth(index)
            .map(element_text)
            .unwrap_or_else(|| missing(field))
    }

    fn extract_deadline(&self, block: ElementRef<'_>) -> String {
        first_text(block, &self.deadline).unwrap_or_else(|| missing("deadline"))
    }

    fn extract_sector(&self, block: ElementRef<'_>) -> String {
        block
            .select(&self.sector)
            .next()
            .map(|sector| collapse_whitespace(&sector.text().collect::<String>()))
            .unwrap_or_else(|| missing("sector"))
    }

    fn extract_salary(&self, block: ElementRef<'_>) -> String {
        let badges: Vec<String> = block
            .select(&self.badges)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();

        if badges.is_empty() {
            return missing("salary");
        }
        badges.join(" ")
    }

    fn extract_skills(&self, block: ElementRef<'_>) -> Vec<String> {
        block
            .select(&self.skills)
            .map(element_text)
            .filter(|skill| !skill.is_empty())
            .collect()
    }
}

fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css).map_err(|e| CrawlError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Trimmed text of the first match, if any
fn first_text(block: ElementRef<'_>, selector: &Selector) -> Option<String> {
    block.select(selector).next().map(element_text)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Logs a missing field and yields the empty placeholder
fn missing(field: &str) -> String {
    tracing::debug!("Listing has no {} element", field);
    String::new()
}

/// Resolves a listing href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragment-only anchors, `javascript:` links
/// and anything that does not resolve to http or https.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
