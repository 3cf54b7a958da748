//! Parsing the delimited plain-text corpus into per-surah verses.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};

pub const SURAH_COUNT: u32 = 114;

/// English and Arabic surah names, in order.
pub const SURAH_NAMES: [(&str, &str); SURAH_COUNT as usize] = [
    ("Al-Fatihah", "الفاتحة"),
    ("Al-Baqarah", "البقرة"),
    ("Aal-E-Imran", "آل عمران"),
    ("An-Nisa", "النساء"),
    ("Al-Ma'idah", "المائدة"),
    ("Al-An'am", "الأنعام"),
    ("Al-A'raf", "الأعراف"),
    ("Al-Anfal", "الأنفال"),
    ("At-Tawbah", "التوبة"),
    ("Yunus", "يونس"),
    ("Hud", "هود"),
    ("Yusuf", "يوسف"),
    ("Ar-Ra'd", "الرعد"),
    ("Ibrahim", "إبراهيم"),
    ("Al-Hijr", "الحجر"),
    ("An-Nahl", "النحل"),
    ("Al-Isra", "الإسراء"),
    ("Al-Kahf", "الكهف"),
    ("Maryam", "مريم"),
    ("Taha", "طه"),
    ("Al-Anbiya", "الأنبياء"),
    ("Al-Hajj", "الحج"),
    ("Al-Mu'minun", "المؤمنون"),
    ("An-Nur", "النور"),
    ("Al-Furqan", "الفرقان"),
    ("Ash-Shu'ara", "الشعراء"),
    ("An-Naml", "النمل"),
    ("Al-Qasas", "القصص"),
    ("Al-Ankabut", "العنكبوت"),
    ("Ar-Rum", "الروم"),
    ("Luqman", "لقمان"),
    ("As-Sajdah", "السجدة"),
    ("Al-Ahzab", "الأحزاب"),
    ("Saba", "سبأ"),
    ("Fatir", "فاطر"),
    ("Ya-Sin", "يس"),
    ("As-Saffat", "الصافات"),
    ("Sad", "ص"),
    ("Az-Zumar", "الزمر"),
    ("Ghafir", "غافر"),
    ("Fussilat", "فصلت"),
    ("Ash-Shura", "الشورى"),
    ("Az-Zukhruf", "الزخرف"),
    ("Ad-Dukhan", "الدخان"),
    ("Al-Jathiyah", "الجاثية"),
    ("Al-Ahqaf", "الأحقاف"),
    ("Muhammad", "محمد"),
    ("Al-Fath", "الفتح"),
    ("Al-Hujurat", "الحجرات"),
    ("Qaf", "ق"),
    ("Adh-Dhariyat", "الذاريات"),
    ("At-Tur", "الطور"),
    ("An-Najm", "النجم"),
    ("Al-Qamar", "القمر"),
    ("Ar-Rahman", "الرحمن"),
    ("Al-Waqi'ah", "الواقعة"),
    ("Al-Hadid", "الحديد"),
    ("Al-Mujadila", "المجادلة"),
    ("Al-Hashr", "الحشر"),
    ("Al-Mumtahanah", "الممتحنة"),
    ("As-Saff", "الصف"),
    ("Al-Jumu'ah", "الجمعة"),
    ("Al-Munafiqun", "المنافقون"),
    ("At-Taghabun", "التغابن"),
    ("At-Talaq", "الطلاق"),
    ("At-Tahrim", "التحريم"),
    ("Al-Mulk", "الملك"),
    ("Al-Qalam", "القلم"),
    ("Al-Haqqah", "الحاقة"),
    ("Al-Ma'arij", "المعارج"),
    ("Nuh", "نوح"),
    ("Al-Jinn", "الجن"),
    ("Al-Muzzammil", "المزمل"),
    ("Al-Muddaththir", "المدثر"),
    ("Al-Qiyamah", "القيامة"),
    ("Al-Insan", "الإنسان"),
    ("Al-Mursalat", "المرسلات"),
    ("An-Naba", "النبأ"),
    ("An-Nazi'at", "النازعات"),
    ("Abasa", "عبس"),
    ("At-Takwir", "التكوير"),
    ("Al-Infitar", "الانفطار"),
    ("Al-Mutaffifin", "المطففين"),
    ("Al-Inshiqaq", "الانشقاق"),
    ("Al-Buruj", "البروج"),
    ("At-Tariq", "الطارق"),
    ("Al-A'la", "الأعلى"),
    ("Al-Ghashiyah", "الغاشية"),
    ("Al-Fajr", "الفجر"),
    ("Al-Balad", "البلد"),
    ("Ash-Shams", "الشمس"),
    ("Al-Layl", "الليل"),
    ("Ad-Duha", "الضحى"),
    ("Ash-Sharh", "الشرح"),
    ("At-Tin", "التين"),
    ("Al-Alaq", "العلق"),
    ("Al-Qadr", "القدر"),
    ("Al-Bayyinah", "البينة"),
    ("Az-Zalzalah", "الزلزلة"),
    ("Al-Adiyat", "العاديات"),
    ("Al-Qari'ah", "القارعة"),
    ("At-Takathur", "التكاثر"),
    ("Al-Asr", "العصر"),
    ("Al-Humazah", "الهمزة"),
    ("Al-Fil", "الفيل"),
    ("Quraysh", "قريش"),
    ("Al-Ma'un", "الماعون"),
    ("Al-Kawthar", "الكوثر"),
    ("Al-Kafirun", "الكافرون"),
    ("An-Nasr", "النصر"),
    ("Al-Masad", "المسد"),
    ("Al-Ikhlas", "الإخلاص"),
    ("Al-Falaq", "الفلق"),
    ("An-Nas", "الناس"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusMeta {
    pub source: String,
    pub text_type: String,
    pub format: String,
    pub license: String,
    pub note: String,
}

impl Default for CorpusMeta {
    fn default() -> Self {
        Self {
            source: "Tanzil.net".to_string(),
            text_type: "Simple".to_string(),
            format: "txt-2".to_string(),
            license: "CC BY 3.0".to_string(),
            note: "Text is verbatim from Tanzil. Do not change the Arabic text. \
                   Include attribution + link to tanzil.net."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub n: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surah {
    pub number: u32,
    pub name_en: String,
    pub name_ar: String,
    pub ayahs: Vec<Verse>,
}

impl Surah {
    fn empty(number: u32) -> Self {
        let (en, ar) = SURAH_NAMES[(number - 1) as usize];
        Self {
            number,
            name_en: en.to_string(),
            name_ar: ar.to_string(),
            ayahs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    pub meta: CorpusMeta,
    pub surahs: Vec<Surah>,
}

impl Corpus {
    pub fn verse_count(&self) -> usize {
        self.surahs.iter().map(|s| s.ayahs.len()).sum()
    }
}

/// Splits one trimmed line into surah, verse and verbatim text.
///
/// `|` is the delimiter when present, TAB otherwise. Text keeps any further delimiters.
fn parse_line(line: &str) -> Option<(u32, u32, String)> {
    let delim = if line.contains('|') { '|' } else { '\t' };
    let mut parts = line.splitn(3, delim);
    let surah = parts.next()?.trim().parse::<u32>().ok()?;
    let verse = parts.next()?.trim().parse::<u32>().ok()?;
    let text = parts.next()?;
    if !(1..=SURAH_COUNT).contains(&surah) || verse < 1 {
        return None;
    }
    Some((surah, verse, text.to_string()))
}

/// Parses the whole corpus. Malformed lines are skipped; every surah must end up with verses.
pub fn parse_corpus(raw: &str) -> BuildResult<Corpus> {
    let mut surahs: Vec<Surah> = (1..=SURAH_COUNT).map(Surah::empty).collect();

    let mut skipped = 0usize;
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match parse_line(line) {
            Some((surah, n, text)) => surahs[(surah - 1) as usize].ayahs.push(Verse { n, text }),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "skipped corpus lines");
    }

    let incomplete: Vec<u32> = surahs
        .iter()
        .filter(|s| s.ayahs.is_empty())
        .map(|s| s.number)
        .collect();
    if !incomplete.is_empty() {
        return Err(BuildError::IncompleteCorpus(incomplete));
    }

    Ok(Corpus {
        meta: CorpusMeta::default(),
        surahs,
    })
}

/// Reads the plain-text corpus at `input` and writes its JSON form to `output`.
pub fn build_corpus(input: &Path, output: &Path) -> BuildResult<Corpus> {
    let raw = crate::read_text(input)?;
    let corpus = parse_corpus(&raw)?;
    crate::write_json_atomic(output, &corpus)?;
    tracing::info!(
        verses = corpus.verse_count(),
        output = %output.display(),
        "wrote corpus"
    );
    Ok(corpus)
}
