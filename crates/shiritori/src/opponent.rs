//! Opponent move provider.
//!
//! The primary source is a generative model behind [`PrimarySource`]; it is
//! untrusted and may fail, stall, or answer with garbage. The fallback is a
//! static dictionary keyed by head syllable. Neither path ever returns an
//! error to the caller: no candidate is simply `None`.

use crate::history::History;
use crate::kana::{self, Syllable, TABOO};
use crate::word::Word;
use async_trait::async_trait;
use derive_getters::Getters;
use derive_more::{Display, Error};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Default time allowed for one primary call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of recent words shown to the generator.
const PROMPT_RECENT_WORDS: usize = 5;

// ─────────────────────────────────────────────────────────────
//  Primary source
// ─────────────────────────────────────────────────────────────

/// Error raised by a primary source. Always recovered by the provider.
#[derive(Debug, Clone, Display, Error)]
#[display("Primary source error: {} at {}:{}", message, file, line)]
pub struct SourceError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl SourceError {
    /// Creates a new source error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Prompt handed to the generator for one opponent move.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct OpponentPrompt {
    /// Syllable the reply must start with.
    #[getter(copy)]
    required_head: Syllable,
    /// Rules the generator has to follow.
    system: String,
    /// The game so far and the request for one word.
    user: String,
}

impl OpponentPrompt {
    /// Builds the prompt for replying to `last_word`.
    #[instrument(skip(history), fields(head = %required_head, last = %last_word))]
    pub fn new(required_head: Syllable, history: &History, last_word: &Word) -> Self {
        let system = format!(
            "あなたは日本語のしりとりの相手です。次のルールを必ず守ってください。\n\
             - ひらがなのことばを1語だけ答える。説明や記号は書かない\n\
             - 『{head}』から始める\n\
             - これまでに出たことばは使わない\n\
             - 『{taboo}』で終わることばは使わない\n\
             - 小さい字や「ー」で終わることばは、しりとりの次の字に気をつける",
            head = required_head,
            taboo = TABOO,
        );

        let recent = history.recent(PROMPT_RECENT_WORDS);
        let played = if recent.is_empty() {
            "なし".to_string()
        } else {
            recent
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join("、")
        };
        let user = format!(
            "これまでのことば: {played}\n\
             最後のことば: {last_word}\n\
             『{required_head}』から始まることばを1語だけ、ひらがなで答えてね。"
        );

        Self {
            required_head,
            system,
            user,
        }
    }
}

/// A fallible generator of opponent words.
#[async_trait]
pub trait PrimarySource: Send + Sync + std::fmt::Debug {
    /// Returns the generator's raw answer.
    async fn generate(&self, prompt: &OpponentPrompt) -> Result<String, SourceError>;
}

/// Takes the first whitespace-delimited token of a raw answer as a word.
pub fn first_token(raw: &str) -> Option<Word> {
    let word = kana::normalize(raw.split_whitespace().next()?);
    (!word.is_empty()).then_some(word)
}

// ─────────────────────────────────────────────────────────────
//  Fallback dictionary
// ─────────────────────────────────────────────────────────────

/// Words the opponent can always fall back on, by head syllable.
const BUILTIN_WORDS: &[(&str, &[&str])] = &[
    ("あ", &["あり", "あめ", "あさ"]),
    ("い", &["いぬ", "いけ", "いか"]),
    ("う", &["うし", "うみ", "うた"]),
    ("え", &["えび", "えき", "えのぐ"]),
    ("お", &["おに", "おか", "おゆ"]),
    ("か", &["かめ", "かさ", "からす"]),
    ("き", &["きつね", "きのこ", "きりん"]),
    ("く", &["くま", "くき", "くるま"]),
    ("け", &["けむし", "けしき", "けが"]),
    ("こ", &["ことり", "こめ", "こおり"]),
    ("さ", &["さかな", "さる", "さくら"]),
    ("し", &["しろ", "しお", "しんぶん"]),
    ("す", &["すいか", "すずめ", "すな"]),
    ("せ", &["せみ", "せかい", "せんべい"]),
    ("そ", &["そら", "そば", "そり"]),
    ("た", &["たまご", "たに", "たこ"]),
    ("ち", &["ちず", "ちから", "ちくわ"]),
    ("つ", &["つき", "つばさ", "つち"]),
    ("て", &["てがみ", "てぶくろ", "てんぷら"]),
    ("と", &["とら", "とけい", "とまと"]),
    ("な", &["なす", "なべ", "なみ"]),
    ("に", &["にわ", "にく", "にじ"]),
    ("ぬ", &["ぬいぐるみ", "ぬの", "ぬま"]),
    ("ね", &["ねこ", "ねぎ", "ねずみ"]),
    ("の", &["のり", "のはら", "のこぎり"]),
    ("は", &["はさみ", "はな", "はっぱ"]),
    ("ひ", &["ひこうき", "ひつじ", "ひみつ"]),
    ("ふ", &["ふね", "ふく", "ふとん"]),
    ("へ", &["へび", "へや", "へいたい"]),
    ("ほ", &["ほし", "ほね", "ほたる"]),
    ("ま", &["まくら", "まめ", "まど"]),
    ("み", &["みず", "みかん", "みち"]),
    ("む", &["むし", "むぎ", "むね"]),
    ("め", &["めがね", "めだか", "めんたいこ"]),
    ("も", &["もも", "もり", "もち"]),
    ("や", &["やま", "やさい", "やぎ"]),
    ("ゆ", &["ゆき", "ゆめ", "ゆび"]),
    ("よ", &["ようふく", "よる", "よこ"]),
    ("ら", &["らっこ", "らっぱ", "らいおん"]),
    ("り", &["りす", "りんご", "りょうり"]),
    ("る", &["るす", "るつぼ", "るーれっと"]),
    ("れ", &["れいぞうこ", "れもん", "れんこん"]),
    ("ろ", &["ろうそく", "ろぼっと", "ろてんぶろ"]),
    ("わ", &["わに", "わごむ", "わた"]),
];

/// Error loading a fallback dictionary.
#[derive(Debug, Clone, Display, Error)]
#[display("Dictionary error: {} at {}:{}", message, file, line)]
pub struct DictionaryError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DictionaryError {
    /// Creates a new dictionary error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        let message = message.into();
        error!(error_message = %message, "Dictionary error created");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// On-disk shape: a table of head syllable to words.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct DictionaryFile(BTreeMap<String, Vec<String>>);

/// Read-only table of known words keyed by head syllable.
#[derive(Debug, Clone, Default)]
pub struct FallbackDictionary {
    entries: HashMap<Syllable, Vec<Word>>,
}

impl FallbackDictionary {
    /// An empty dictionary; the fallback never answers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in dictionary.
    pub fn builtin() -> Self {
        let entries = BUILTIN_WORDS
            .iter()
            .filter_map(|(head, words)| {
                let head = Syllable::parse(head)?;
                Some((head, words.iter().map(|w| kana::normalize(w)).collect()))
            })
            .collect();
        Self { entries }
    }

    /// Builds a dictionary from `(head, words)` pairs.
    ///
    /// Heads must normalize to one syllable; words are normalized and empty
    /// ones dropped.
    #[instrument(skip(pairs))]
    pub fn from_entries<I, K, W, S>(pairs: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = (K, W)>,
        K: AsRef<str>,
        W: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: HashMap<Syllable, Vec<Word>> = HashMap::new();
        for (head, words) in pairs {
            let head_text = head.as_ref();
            let syllable = Syllable::parse(head_text).ok_or_else(|| {
                DictionaryError::new(format!("Key {head_text:?} is not a single syllable"))
            })?;
            entries.entry(syllable.base()).or_default().extend(
                words
                    .into_iter()
                    .map(|w| kana::normalize(w.as_ref()))
                    .filter(|w| !w.is_empty()),
            );
        }
        debug!(heads = entries.len(), "Built fallback dictionary");
        Ok(Self { entries })
    }

    /// Parses a TOML table such as `"あ" = ["あり", "あめ"]`.
    pub fn from_toml_str(content: &str) -> Result<Self, DictionaryError> {
        let file: DictionaryFile = toml::from_str(content)
            .map_err(|e| DictionaryError::new(format!("Failed to parse dictionary: {}", e)))?;
        Self::from_entries(file.0)
    }

    /// Loads a TOML dictionary from disk.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DictionaryError::new(format!("Failed to read dictionary file: {}", e))
        })?;
        let dictionary = Self::from_toml_str(&content)?;
        info!(heads = dictionary.len(), "Fallback dictionary loaded");
        Ok(dictionary)
    }

    /// Words listed under a head syllable.
    pub fn words_for(&self, head: Syllable) -> &[Word] {
        self.entries
            .get(&head.base())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of head syllables with entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no head has entries.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Picks an unused word for `head` uniformly at random.
    pub fn choose_with<R: Rng + ?Sized>(
        &self,
        head: Syllable,
        used: &HashSet<Word>,
        rng: &mut R,
    ) -> Option<Word> {
        let candidates: Vec<&Word> = self
            .words_for(head)
            .iter()
            .filter(|w| !used.contains(*w))
            .collect();
        candidates.choose(rng).map(|w| (*w).clone())
    }

    /// Picks an unused word for `head` with the thread-local RNG.
    pub fn choose(&self, head: Syllable, used: &HashSet<Word>) -> Option<Word> {
        self.choose_with(head, used, &mut rand::thread_rng())
    }
}

// ─────────────────────────────────────────────────────────────
//  Provider
// ─────────────────────────────────────────────────────────────

/// Supplies opponent candidates from the primary source and the fallback.
#[derive(Debug, Clone)]
pub struct OpponentMoveProvider {
    primary: Option<Arc<dyn PrimarySource>>,
    fallback: Arc<FallbackDictionary>,
    timeout: Duration,
}

impl OpponentMoveProvider {
    /// Creates a fallback-only provider.
    #[instrument(skip(fallback), fields(heads = fallback.len()))]
    pub fn new(fallback: Arc<FallbackDictionary>) -> Self {
        Self {
            primary: None,
            fallback,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Adds a primary source.
    pub fn with_primary(mut self, primary: Arc<dyn PrimarySource>) -> Self {
        info!(?primary, "Primary source configured");
        self.primary = Some(primary);
        self
    }

    /// Sets the time allowed for one primary call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if a primary source is configured.
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// The fallback dictionary.
    pub fn fallback(&self) -> &FallbackDictionary {
        &self.fallback
    }

    /// Asks the primary source once.
    ///
    /// Timeouts, errors and unusable answers are logged and become `None`.
    #[instrument(skip(self, history, last_word), fields(head = %required_head))]
    pub async fn propose_primary(
        &self,
        required_head: Syllable,
        history: &History,
        last_word: &Word,
    ) -> Option<Word> {
        let Some(source) = &self.primary else {
            debug!("No primary source configured");
            return None;
        };

        let prompt = OpponentPrompt::new(required_head, history, last_word);
        match tokio::time::timeout(self.timeout, source.generate(&prompt)).await {
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Primary source timed out");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Primary source failed");
                None
            }
            Ok(Ok(raw)) => {
                let candidate = first_token(&raw);
                match &candidate {
                    Some(word) => debug!(word = %word, "Primary source proposed a word"),
                    None => warn!(response = %raw, "Primary source gave no usable word"),
                }
                candidate
            }
        }
    }

    /// Picks an unused word from the fallback dictionary.
    #[instrument(skip(self, used), fields(head = %required_head))]
    pub fn propose_fallback(&self, required_head: Syllable, used: &HashSet<Word>) -> Option<Word> {
        let candidate = self.fallback.choose(required_head, used);
        match &candidate {
            Some(word) => debug!(word = %word, "Fallback proposed a word"),
            None => debug!("Fallback has no unused word"),
        }
        candidate
    }

    /// Asks the primary source, then the fallback.
    pub async fn propose(
        &self,
        required_head: Syllable,
        history: &History,
        last_word: &Word,
    ) -> Option<Word> {
        match self.propose_primary(required_head, history, last_word).await {
            Some(word) => Some(word),
            None => self.propose_fallback(required_head, history.used()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::io::Write;

    fn syl(c: char) -> Syllable {
        Syllable::new(c).expect("canonical test syllable")
    }

    #[derive(Debug)]
    struct Echo(&'static str);

    #[async_trait]
    impl PrimarySource for Echo {
        async fn generate(&self, _prompt: &OpponentPrompt) -> Result<String, SourceError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug)]
    struct Broken;

    #[async_trait]
    impl PrimarySource for Broken {
        async fn generate(&self, _prompt: &OpponentPrompt) -> Result<String, SourceError> {
            Err(SourceError::new("connection refused"))
        }
    }

    #[derive(Debug)]
    struct Stalled;

    #[async_trait]
    impl PrimarySource for Stalled {
        async fn generate(&self, _prompt: &OpponentPrompt) -> Result<String, SourceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("こま".to_string())
        }
    }

    #[test]
    fn test_first_token_takes_leading_word() {
        assert_eq!(first_token("  コアラ です\n"), Some(Word::from("こあら")));
        assert_eq!(first_token("「こま」"), Some(Word::from("こま")));
        assert_eq!(first_token("koala"), None);
        assert_eq!(first_token("   "), None);
    }

    #[test]
    fn test_builtin_covers_basic_heads() {
        let dictionary = FallbackDictionary::builtin();
        assert_eq!(dictionary.len(), 44);
        assert_eq!(dictionary.words_for(syl('こ')).len(), 3);
        assert!(dictionary.words_for(syl('ん')).is_empty());
    }

    #[test]
    fn test_small_head_uses_large_entries() {
        let dictionary = FallbackDictionary::builtin();
        assert_eq!(dictionary.words_for(syl('ゃ')), dictionary.words_for(syl('や')));
    }

    #[test]
    fn test_choose_skips_used_words() {
        let dictionary = FallbackDictionary::builtin();
        let used: HashSet<Word> = ["ことり", "こめ"].into_iter().map(Word::from).collect();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(
                dictionary.choose_with(syl('こ'), &used, &mut rng),
                Some(Word::from("こおり"))
            );
        }
    }

    #[test]
    fn test_choose_exhausted_head() {
        let dictionary = FallbackDictionary::builtin();
        let used: HashSet<Word> = dictionary.words_for(syl('そ')).iter().cloned().collect();
        assert_eq!(dictionary.choose(syl('そ'), &used), None);
    }

    #[test]
    fn test_from_toml_str() {
        let dictionary =
            FallbackDictionary::from_toml_str("\"コ\" = [\"コアラ\", \"abc\"]\n\"ま\" = [\"まり\"]")
                .unwrap();
        assert_eq!(dictionary.words_for(syl('こ')), &[Word::from("こあら")]);
        assert_eq!(dictionary.words_for(syl('ま')), &[Word::from("まり")]);
    }

    #[test]
    fn test_from_toml_rejects_long_key() {
        let err = FallbackDictionary::from_toml_str("\"ねこ\" = [\"ねずみ\"]").unwrap_err();
        assert!(err.message.contains("single syllable"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\"あ\" = [\"あひる\"]").unwrap();
        let dictionary = FallbackDictionary::from_file(file.path()).unwrap();
        assert_eq!(dictionary.words_for(syl('あ')), &[Word::from("あひる")]);
    }

    #[test]
    fn test_prompt_mentions_head_and_recent_words() {
        let history = History::from_raw(["ねこ", "こま", "まり"]);
        let prompt = OpponentPrompt::new(syl('り'), &history, &Word::from("まり"));
        assert!(prompt.system().contains("『り』から始める"));
        assert!(prompt.user().contains("ねこ、こま、まり"));
        assert!(prompt.user().contains("最後のことば: まり"));
    }

    #[tokio::test]
    async fn test_primary_answer_is_normalized() {
        let provider = OpponentMoveProvider::new(Arc::new(FallbackDictionary::empty()))
            .with_primary(Arc::new(Echo("コアラ\nです")));
        let history = History::from_raw(["ねこ"]);
        let word = provider
            .propose_primary(syl('こ'), &history, &Word::from("ねこ"))
            .await;
        assert_eq!(word, Some(Word::from("こあら")));
    }

    #[tokio::test]
    async fn test_failing_primary_falls_back() {
        let provider = OpponentMoveProvider::new(Arc::new(FallbackDictionary::builtin()))
            .with_primary(Arc::new(Broken));
        let history = History::from_raw(["ねこ"]);
        let word = provider
            .propose(syl('こ'), &history, &Word::from("ねこ"))
            .await
            .expect("fallback word");
        assert_eq!(word.head(), Some(syl('こ')));
    }

    #[tokio::test]
    async fn test_stalled_primary_times_out() {
        let provider = OpponentMoveProvider::new(Arc::new(FallbackDictionary::empty()))
            .with_primary(Arc::new(Stalled))
            .with_timeout(Duration::from_millis(20));
        let history = History::from_raw(["ねこ"]);
        let word = provider
            .propose(syl('こ'), &history, &Word::from("ねこ"))
            .await;
        assert_eq!(word, None);
    }

    #[tokio::test]
    async fn test_unconfigured_primary_is_silent() {
        let provider = OpponentMoveProvider::new(Arc::new(FallbackDictionary::empty()));
        assert!(!provider.has_primary());
        let word = provider
            .propose_primary(syl('こ'), &History::new(), &Word::from("ねこ"))
            .await;
        assert_eq!(word, None);
    }
}
