use crate::error::ConfigError;
use crate::segmenter::{OptionScript, Scoring, ScoringProfile, SegmenterConfig};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 待处理文档目录
    pub input_folder: String,
    /// JSON 文档库根目录
    pub output_folder: String,
    /// 不完整题目清单
    pub warn_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 同时处理的文档数量
    pub max_concurrent_documents: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 切分配置 ---
    /// 选项字母表，`None` 为自动检测
    pub option_script: Option<OptionScript>,
    pub scoring_profile: ScoringProfile,
    /// 覆盖计分方案的 TOML 文件
    pub scoring_file: Option<String>,
    pub min_text_chars: usize,
    pub mc_range_start: u32,
    pub mc_range_end: u32,
    pub expected_total_points: Option<u32>,
    // --- LLM 配置 ---
    pub llm_enabled: bool,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_retries: u32,
    // --- Mathpix 配置 ---
    pub mathpix_app_id: String,
    pub mathpix_app_key: String,
    pub mathpix_api_url: String,
    pub mathpix_poll_attempts: u32,
    pub mathpix_poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_folder: "input".to_string(),
            output_folder: "output".to_string(),
            warn_file: "warn.txt".to_string(),
            output_log_file: "output.txt".to_string(),
            max_concurrent_documents: 4,
            verbose_logging: false,
            option_script: None,
            scoring_profile: ScoringProfile::Graded,
            scoring_file: None,
            min_text_chars: 10,
            mc_range_start: 1,
            mc_range_end: 40,
            expected_total_points: None,
            llm_enabled: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_retries: 3,
            mathpix_app_id: String::new(),
            mathpix_app_key: String::new(),
            mathpix_api_url: "https://api.mathpix.com/v3".to_string(),
            mathpix_poll_attempts: 30,
            mathpix_poll_interval_ms: 2000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(default.input_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            warn_file: std::env::var("WARN_FILE").unwrap_or(default.warn_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            max_concurrent_documents: std::env::var("MAX_CONCURRENT_DOCUMENTS").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.max_concurrent_documents),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            option_script: std::env::var("OPTION_SCRIPT").ok().and_then(|v| OptionScript::parse(&v)),
            scoring_profile: std::env::var("SCORING_PROFILE").ok().and_then(|v| ScoringProfile::from_str(&v)).unwrap_or(default.scoring_profile),
            scoring_file: std::env::var("SCORING_FILE").ok().filter(|v| !v.trim().is_empty()),
            min_text_chars: std::env::var("MIN_TEXT_CHARS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.min_text_chars),
            mc_range_start: std::env::var("MC_RANGE_START").ok().and_then(|v| v.parse().ok()).unwrap_or(default.mc_range_start),
            mc_range_end: std::env::var("MC_RANGE_END").ok().and_then(|v| v.parse().ok()).unwrap_or(default.mc_range_end),
            expected_total_points: std::env::var("EXPECTED_TOTAL_POINTS").ok().and_then(|v| v.parse().ok()),
            llm_enabled: std::env::var("LLM_ENABLED").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_enabled),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_max_retries: std::env::var("LLM_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.llm_max_retries),
            mathpix_app_id: std::env::var("MATHPIX_APP_ID").unwrap_or(default.mathpix_app_id),
            mathpix_app_key: std::env::var("MATHPIX_APP_KEY").unwrap_or(default.mathpix_app_key),
            mathpix_api_url: std::env::var("MATHPIX_API_URL").unwrap_or(default.mathpix_api_url),
            mathpix_poll_attempts: std::env::var("MATHPIX_POLL_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.mathpix_poll_attempts),
            mathpix_poll_interval_ms: std::env::var("MATHPIX_POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.mathpix_poll_interval_ms),
        }
    }

    /// 构建切分核心使用的纯配置；`scoring` 为从文件加载的方案（若有）
    pub fn segmenter_config(&self, scoring: Option<Scoring>) -> SegmenterConfig {
        SegmenterConfig {
            question_range: self.mc_range_start..=self.mc_range_end,
            script: self.option_script,
            min_text_chars: self.min_text_chars,
            scoring: scoring.unwrap_or_else(|| Scoring::from_profile(self.scoring_profile)),
            expected_total_points: self.expected_total_points,
            ..SegmenterConfig::default()
        }
    }

    /// 检查互相矛盾的配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mc_range_start == 0 || self.mc_range_start > self.mc_range_end {
            return Err(ConfigError::Invalid {
                name: "MC_RANGE_START/MC_RANGE_END".to_string(),
                reason: format!("{}..={} 不是有效的题号范围", self.mc_range_start, self.mc_range_end),
            });
        }
        if self.max_concurrent_documents == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_CONCURRENT_DOCUMENTS".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// Mathpix 凭据是否齐全
    pub fn has_mathpix_credentials(&self) -> bool {
        !self.mathpix_app_id.is_empty() && !self.mathpix_app_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::PointTable;

    #[test]
    fn test_segmenter_config_uses_profile() {
        let config = Config {
            scoring_profile: ScoringProfile::Flat,
            mc_range_end: 36,
            ..Config::default()
        };
        let seg = config.segmenter_config(None);
        assert_eq!(seg.question_range, 1..=36);
        assert_eq!(seg.scoring.multiple_choice, PointTable::flat(1));
        assert_eq!(seg.max_options, 5);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        assert!(Config::default().validate().is_ok());
        let config = Config {
            mc_range_start: 30,
            mc_range_end: 10,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_loaded_scoring_overrides_profile() {
        let loaded = Scoring {
            multiple_choice: PointTable::flat(4),
            ..Scoring::default()
        };
        let seg = Config::default().segmenter_config(Some(loaded));
        assert_eq!(seg.scoring.multiple_choice.lookup(1), 4);
    }
}
