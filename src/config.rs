use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};

use crate::api::RelationType;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Base URL of the course REST service.
    #[arg(long, env = "COURSE_GRAPH_API", default_value = "http://localhost:8080/api")]
    pub api_base: String,

    /// Course whose knowledge graph is opened.
    #[arg(long, env = "COURSE_GRAPH_COURSE")]
    pub course: u64,

    /// Bearer token sent with every request.
    #[arg(long, env = "COURSE_GRAPH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable node/relation creation, editing and position saving.
    #[arg(long)]
    pub editable: bool,

    #[arg(long, value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    /// Extra font file (e.g. a CJK font for the `zh` locale).
    #[arg(long)]
    pub font: Option<PathBuf>,

    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,

    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// Short caption for a relation type; unknown types show their raw name.
    pub fn relation_tag(self, kind: &RelationType) -> &str {
        match (self, kind) {
            (Self::En, RelationType::Prerequisite) => "prereq",
            (Self::En, RelationType::Related) => "related",
            (Self::En, RelationType::PartOf) => "part of",
            (Self::Zh, RelationType::Prerequisite) => "前置",
            (Self::Zh, RelationType::Related) => "相关",
            (Self::Zh, RelationType::PartOf) => "包含",
            (_, RelationType::Other(raw)) => raw.as_str(),
        }
    }

    /// Base text and number separator for generated node labels.
    pub fn default_node_label(self) -> (&'static str, &'static str) {
        match self {
            Self::En => ("New node", " "),
            Self::Zh => ("新节点", ""),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub course_id: u64,
    pub token: Option<String>,
    pub editable: bool,
    pub locale: Locale,
    pub request_timeout: Duration,
    pub extra_font: Option<Vec<u8>>,
}

impl AppConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let api_base_url = args.api_base.trim().trim_end_matches('/').to_owned();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            bail!("--api-base must be an http(s) URL, got {:?}", args.api_base);
        }

        if args.timeout_secs == 0 {
            bail!("--timeout-secs must be at least 1");
        }

        let token = args
            .token
            .map(|token| token.trim().to_owned())
            .filter(|token| !token.is_empty());

        let extra_font = args
            .font
            .as_ref()
            .map(|path| {
                std::fs::read(path)
                    .with_context(|| format!("failed to read font file {}", path.display()))
            })
            .transpose()?;

        Ok(Self {
            api_base_url,
            course_id: args.course,
            token,
            editable: args.editable,
            locale: args.locale,
            request_timeout: Duration::from_secs(args.timeout_secs),
            extra_font,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["course-graph", "--course", "12"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_are_read_only_english() {
        let config = AppConfig::from_args(parse(&["--api-base", "http://lms.local/api/"])).unwrap();
        assert_eq!(config.api_base_url, "http://lms.local/api");
        assert_eq!(config.course_id, 12);
        assert!(!config.editable);
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert!(config.extra_font.is_none());
    }

    #[test]
    fn blank_token_is_ignored() {
        let config = AppConfig::from_args(parse(&[
            "--api-base",
            "https://lms.example/api",
            "--token",
            "   ",
        ]))
        .unwrap();
        assert_eq!(config.token, None);
    }

    #[test]
    fn non_http_base_is_rejected() {
        let error = AppConfig::from_args(parse(&["--api-base", "ftp://lms.local"])).unwrap_err();
        assert!(error.to_string().contains("--api-base"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(
            AppConfig::from_args(parse(&[
                "--api-base",
                "http://lms.local",
                "--timeout-secs",
                "0"
            ]))
            .is_err()
        );
    }

    #[test]
    fn missing_font_file_reports_the_path() {
        let error = AppConfig::from_args(parse(&[
            "--api-base",
            "http://lms.local",
            "--font",
            "/definitely/not/here.ttf",
        ]))
        .unwrap_err();
        assert!(format!("{error:#}").contains("/definitely/not/here.ttf"));
    }

    #[test]
    fn relation_tags_are_localized() {
        assert_eq!(Locale::En.relation_tag(&RelationType::PartOf), "part of");
        assert_eq!(Locale::Zh.relation_tag(&RelationType::Prerequisite), "前置");
        assert_eq!(
            Locale::Zh.relation_tag(&RelationType::Other("contrasts_with".to_owned())),
            "contrasts_with"
        );
    }
}
