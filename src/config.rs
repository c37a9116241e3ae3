use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub body: BodyConfig,
    #[serde(default)]
    pub reconstruction: ReconstructionConfig,
    #[serde(default)]
    pub smooth: SmoothConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BodyConfig {
    /// 身長（メートル）
    #[serde(default = "default_height")]
    pub height: f32,
}

/// フレームで方向ベクトルが求まらないときの扱い
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// そのフレームは `DegenerateGeometry` を返す
    #[default]
    Error,
    /// 頭部の基底をワールド軸で、上腕を +Z で代用する
    Fallback,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconstructionConfig {
    #[serde(default)]
    pub degenerate: DegeneratePolicy,
    /// |前腕点 - 手首| とモデルの前腕長の許容相対誤差
    #[serde(default = "default_forearm_tolerance")]
    pub forearm_tolerance: f32,
    /// 肘の屈曲角が可動域に収まるよう上腕を回転させる
    #[serde(default)]
    pub clamp_elbow_flexion: bool,
    #[serde(default = "default_max_elbow_flexion")]
    pub max_elbow_flexion_deg: f32,
    /// バッチ再構成を rayon のスレッドプールで行う
    #[serde(default)]
    pub parallel: bool,
}

/// 再構成後に適用する時間方向のフィルタ
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    None,
    #[default]
    Ema,
    OneEuro,
}

/// EMA平滑化係数 (1.0 = 平滑化なし)
#[derive(Debug, Deserialize, Clone)]
pub struct SmoothConfig {
    #[serde(default)]
    pub mode: FilterMode,
    #[serde(default = "default_smooth_alpha")]
    pub position: f32,
}

/// One Euro フィルタのパラメータ
#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_min_cutoff")]
    pub min_cutoff: f32,
    #[serde(default = "default_beta")]
    pub beta: f32,
    #[serde(default = "default_d_cutoff")]
    pub d_cutoff: f32,
}

fn default_height() -> f32 { 1.75 }
fn default_forearm_tolerance() -> f32 { 0.35 }
fn default_max_elbow_flexion() -> f32 { 150.0 }
fn default_smooth_alpha() -> f32 { 0.5 }
fn default_min_cutoff() -> f32 { 1.0 }
fn default_beta() -> f32 { 0.01 }
fn default_d_cutoff() -> f32 { 1.0 }

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            height: default_height(),
        }
    }
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            degenerate: DegeneratePolicy::default(),
            forearm_tolerance: default_forearm_tolerance(),
            clamp_elbow_flexion: false,
            max_elbow_flexion_deg: default_max_elbow_flexion(),
            parallel: false,
        }
    }
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            mode: FilterMode::default(),
            position: default_smooth_alpha(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_cutoff: default_min_cutoff(),
            beta: default_beta(),
            d_cutoff: default_d_cutoff(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// ファイルが無ければデフォルト値。壊れたファイルは警告を出して無視する
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("config {} ignored: {:#}", path.display(), e);
                Self::default()
            }
        }
    }
}
