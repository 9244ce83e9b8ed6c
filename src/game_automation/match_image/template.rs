//! The fixed vocabulary of UI tokens and their reference images

use crate::game_automation::error::{RunError, RunResult};
use image::GrayImage;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One recognizable UI element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    QuickStart,
    Next,
    StartBattle,
    Choice,
    Tag,
    Note,
    Hundred,
    Buy,
    Refresh,
    Back,
    Leave,
    Save,
    EnterShop,
    NotEnoughMoney,
    Enter,
    Confirm,
    Select,
    SelectConfirm,
    Shop,
    Strengthen,
    SoldOut,
}

impl Token {
    pub const ALL: [Token; 21] = [
        Token::QuickStart,
        Token::Next,
        Token::StartBattle,
        Token::Choice,
        Token::Tag,
        Token::Note,
        Token::Hundred,
        Token::Buy,
        Token::Refresh,
        Token::Back,
        Token::Leave,
        Token::Save,
        Token::EnterShop,
        Token::NotEnoughMoney,
        Token::Enter,
        Token::Confirm,
        Token::Select,
        Token::SelectConfirm,
        Token::Shop,
        Token::Strengthen,
        Token::SoldOut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Token::QuickStart => "quick_start",
            Token::Next => "next",
            Token::StartBattle => "start_battle",
            Token::Choice => "choice",
            Token::Tag => "tag",
            Token::Note => "note",
            Token::Hundred => "hundred",
            Token::Buy => "buy",
            Token::Refresh => "refresh",
            Token::Back => "back",
            Token::Leave => "leave",
            Token::Save => "save",
            Token::EnterShop => "enter_shop",
            Token::NotEnoughMoney => "not_enough_money",
            Token::Enter => "enter",
            Token::Confirm => "confirm",
            Token::Select => "select",
            Token::SelectConfirm => "select_confirm",
            Token::Shop => "shop",
            Token::Strengthen => "strengthen",
            Token::SoldOut => "sold_out",
        }
    }

    /// Asset file inside the template directory
    pub fn file_name(self) -> &'static str {
        match self {
            Token::QuickStart => "quick_start_button.png",
            Token::Hundred => "100.png",
            Token::Enter => "enter_button.png",
            Token::Next => "next.png",
            Token::StartBattle => "start_battle.png",
            Token::Choice => "choice.png",
            Token::Tag => "tag.png",
            Token::Note => "note.png",
            Token::Buy => "buy.png",
            Token::Refresh => "refresh.png",
            Token::Back => "back.png",
            Token::Leave => "leave.png",
            Token::Save => "save.png",
            Token::EnterShop => "enter_shop.png",
            Token::NotEnoughMoney => "not_enough_money.png",
            Token::Confirm => "confirm.png",
            Token::Select => "select.png",
            Token::SelectConfirm => "select_confirm.png",
            Token::Shop => "shop.png",
            Token::Strengthen => "strengthen.png",
            Token::SoldOut => "sold_out.png",
        }
    }

    /// Buttons of the entry sequence, the only waits the skip hotkey cuts short
    pub fn is_initial(self) -> bool {
        matches!(self, Token::QuickStart | Token::Next | Token::StartBattle)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    pub token: Token,
    pub image: GrayImage,
    pub path: Option<PathBuf>,
}

impl Template {
    pub fn new(token: Token, image: GrayImage, path: Option<PathBuf>) -> Self {
        Self { token, image, path }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Reference images keyed by token, loaded once and held for the process lifetime
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    dir: PathBuf,
    templates: HashMap<Token, Template>,
}

impl TemplateLibrary {
    /// Load every token's asset from `dir`.
    ///
    /// Missing or unreadable files are logged and left out, so detection of
    /// that token always reports "not found".
    pub fn load(dir: &Path) -> Self {
        let mut templates = HashMap::new();
        for token in Token::ALL {
            let path = dir.join(token.file_name());
            if !path.is_file() {
                log::warn!("⚠️ Template {} missing: {}", token, path.display());
                continue;
            }
            match image::open(&path) {
                Ok(img) => {
                    let gray = img.to_luma8();
                    log::debug!(
                        "🖼️ Loaded template {} ({}x{})",
                        token,
                        gray.width(),
                        gray.height()
                    );
                    templates.insert(token, Template::new(token, gray, Some(path)));
                }
                Err(e) => log::warn!("⚠️ Failed to load template {}: {}", path.display(), e),
            }
        }
        log::info!(
            "🖼️ Loaded {}/{} templates from {}",
            templates.len(),
            Token::ALL.len(),
            dir.display()
        );
        Self {
            dir: dir.to_path_buf(),
            templates,
        }
    }

    /// Build a library from in-memory images
    pub fn from_images(images: impl IntoIterator<Item = (Token, GrayImage)>) -> Self {
        Self {
            dir: PathBuf::new(),
            templates: images
                .into_iter()
                .map(|(token, image)| (token, Template::new(token, image, None)))
                .collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get(&self, token: Token) -> Option<&Template> {
        self.templates.get(&token)
    }

    /// Like `get`, but a missing template is an error
    pub fn require(&self, token: Token) -> RunResult<&Template> {
        self.get(token).ok_or_else(|| RunError::MissingTemplate {
            token,
            path: self.dir.join(token.file_name()),
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn missing(&self) -> Vec<Token> {
        Token::ALL
            .into_iter()
            .filter(|t| !self.templates.contains_key(t))
            .collect()
    }
}
