// src/registration.rs

//! Guided onboarding state machine.
//!
//! LANGUAGE → WELCOME → AGE → GENDER → INTEREST → CITY → NAME → BIO →
//! PHOTO (up to 3) → CONFIRM → DONE. The draft lives in the per-viewer
//! session and is committed to the store only at CONFIRM, so an abandoned
//! registration leaves no half-profile. Language is the one exception: it
//! is persisted as soon as it is chosen.

use validator::Validate;

use crate::gazetteer;
use crate::i18n::tr;
use crate::models::{Gender, Interest, Lang, User};
use crate::transport::{Button, Keyboard};

pub const MAX_PHOTOS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Language,
    Age,
    Gender,
    Interest,
    City,
    Name,
    Bio,
    Photo,
    Confirm,
}

#[derive(Debug, Default, Clone, Validate)]
pub struct ProfileDraft {
    #[validate(range(min = 18, max = 100))]
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub interest: Option<Interest>,
    pub city: Option<String>,
    pub coordinates: Option<(f64, f64)>,
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub bio: Option<String>,
    pub photos: Vec<String>,
}

impl ProfileDraft {
    fn from_user(user: &User) -> Self {
        Self {
            age: user.age,
            gender: user.gender,
            interest: user.interest,
            city: user.city.clone(),
            coordinates: user.coordinates(),
            name: user.name.clone(),
            bio: user.bio.clone(),
            photos: user.photos.clone(),
        }
    }

    fn first_missing(&self) -> Step {
        if self.age.is_none() {
            Step::Age
        } else if self.gender.is_none() {
            Step::Gender
        } else if self.interest.is_none() {
            Step::Interest
        } else if self.city.as_deref().is_none_or(str::is_empty) {
            Step::City
        } else if self.name.as_deref().is_none_or(str::is_empty) {
            Step::Name
        } else if self.bio.as_deref().is_none_or(str::is_empty) {
            Step::Bio
        } else if self.photos.is_empty() {
            Step::Photo
        } else {
            Step::Confirm
        }
    }
}

/// One normalized inbound event for the machine.
#[derive(Debug, Clone)]
pub enum Input<'a> {
    Callback(&'a str),
    Text(&'a str),
    Photo(&'a str),
    Location { latitude: f64, longitude: f64 },
    Unsupported,
}

/// An outbound message the handler should emit.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Side effect the handler must apply after a transition.
#[derive(Debug, Clone)]
pub enum Effect {
    None,
    /// Persist the chosen language immediately.
    PersistLanguage(Lang),
    /// CONFIRM accepted: commit the draft and leave the flow.
    Commit(ProfileDraft),
}

#[derive(Debug)]
pub struct Outcome {
    pub replies: Vec<Reply>,
    pub effect: Effect,
}

impl Outcome {
    fn replies(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            effect: Effect::None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Onboarding {
    pub step: Step,
    pub lang: Lang,
    pub draft: ProfileDraft,
}

impl Onboarding {
    /// Fresh registration, starting with language selection.
    pub fn start() -> (Self, Vec<Reply>) {
        let flow = Self {
            step: Step::Language,
            lang: Lang::Ru,
            draft: ProfileDraft::default(),
        };
        let prompt = flow.prompt();
        (flow, vec![prompt])
    }

    /// Re-entry for a user with a partial profile: prefill the draft and
    /// resume at the first missing field.
    pub fn resume_from(user: &User) -> (Self, Vec<Reply>) {
        let draft = ProfileDraft::from_user(user);
        let flow = Self {
            step: draft.first_missing(),
            lang: user.language,
            draft,
        };
        let prompt = flow.prompt();
        (flow, vec![prompt])
    }

    /// The prompt for the current step.
    pub fn prompt(&self) -> Reply {
        let lang = self.lang;
        match self.step {
            Step::Language => Reply::with_keyboard(
                tr(lang, "choose_language"),
                Keyboard::inline(vec![vec![
                    Button::callback("Русский", "lang_ru"),
                    Button::callback("English", "lang_en"),
                ]]),
            ),
            Step::Age => Reply::plain(tr(lang, "ask_age")),
            Step::Gender => Reply::with_keyboard(
                tr(lang, "ask_gender"),
                Keyboard::reply(vec![vec![
                    Button::text(tr(lang, "btn_male")),
                    Button::text(tr(lang, "btn_female")),
                ]]),
            ),
            Step::Interest => Reply::with_keyboard(
                tr(lang, "ask_interest"),
                Keyboard::reply(vec![vec![
                    Button::text(tr(lang, "btn_girls")),
                    Button::text(tr(lang, "btn_boys")),
                    Button::text(tr(lang, "btn_all")),
                ]]),
            ),
            Step::City => Reply::with_keyboard(
                tr(lang, "ask_city"),
                Keyboard::reply(vec![vec![Button::location(tr(lang, "btn_send_location"))]]),
            ),
            Step::Name => Reply::plain(tr(lang, "ask_name")),
            Step::Bio => Reply::plain(tr(lang, "ask_bio")),
            Step::Photo => Reply::with_keyboard(
                tr(lang, "ask_photo"),
                Keyboard::reply(vec![vec![
                    Button::text(tr(lang, "btn_skip")),
                    Button::text(tr(lang, "btn_done")),
                ]]),
            ),
            Step::Confirm => Reply::with_keyboard(
                self.preview(),
                Keyboard::inline(vec![vec![
                    Button::callback(tr(lang, "btn_confirm_yes"), "confirm_yes"),
                    Button::callback(tr(lang, "btn_confirm_change"), "confirm_change"),
                ]]),
            ),
        }
    }

    /// Profile summary shown at the CONFIRM gate.
    fn preview(&self) -> String {
        let d = &self.draft;
        let mut lines = vec![tr(self.lang, "confirm_header").to_string()];
        if let Some(name) = &d.name {
            lines.push(name.clone());
        }
        if let Some(age) = d.age {
            lines.push(format!("{}", age));
        }
        if let Some(city) = &d.city {
            lines.push(city.clone());
        }
        if let Some(bio) = &d.bio {
            lines.push(bio.clone());
        }
        lines.push(format!("📷 {}", d.photos.len()));
        lines.join("\n")
    }

    pub fn handle(&mut self, input: Input<'_>) -> Outcome {
        // A language switch (via /language) is honored at any step; the
        // current prompt is repeated in the new language.
        if self.step != Step::Language {
            if let Input::Callback(token) = &input {
                if let Some(lang) = lang_from_token(token) {
                    self.lang = lang;
                    return Outcome {
                        replies: vec![
                            Reply::plain(tr(lang, "language_set")),
                            self.prompt(),
                        ],
                        effect: Effect::PersistLanguage(lang),
                    };
                }
            }
        }
        match self.step {
            Step::Language => self.on_language(input),
            Step::Age => self.on_age(input),
            Step::Gender => self.on_gender(input),
            Step::Interest => self.on_interest(input),
            Step::City => self.on_city(input),
            Step::Name => self.on_name(input),
            Step::Bio => self.on_bio(input),
            Step::Photo => self.on_photo(input),
            Step::Confirm => self.on_confirm(input),
        }
    }

    fn advance(&mut self, to: Step, mut lead: Vec<Reply>) -> Outcome {
        self.step = to;
        lead.push(self.prompt());
        Outcome::replies(lead)
    }

    fn reprompt(&self, error_key: &'static str) -> Outcome {
        Outcome::replies(vec![
            Reply::plain(tr(self.lang, error_key)),
            self.prompt(),
        ])
    }

    fn on_language(&mut self, input: Input<'_>) -> Outcome {
        let Input::Callback(token) = input else {
            // The language prompt only reacts to its buttons.
            return Outcome::replies(Vec::new());
        };
        let Some(lang) = lang_from_token(token) else {
            return Outcome::replies(Vec::new());
        };
        self.lang = lang;
        let welcome = Reply::plain(tr(lang, "welcome"));
        let mut outcome = self.advance(self.draft.first_missing(), vec![welcome]);
        outcome.effect = Effect::PersistLanguage(lang);
        outcome
    }

    fn on_age(&mut self, input: Input<'_>) -> Outcome {
        let Input::Text(text) = input else {
            return self.reprompt("bad_age");
        };
        match text.trim().parse::<i32>() {
            Ok(age) if (18..=100).contains(&age) => {
                self.draft.age = Some(age);
                self.advance(Step::Gender, Vec::new())
            }
            _ => self.reprompt("bad_age"),
        }
    }

    fn on_gender(&mut self, input: Input<'_>) -> Outcome {
        let Input::Text(text) = input else {
            return self.reprompt("bad_choice");
        };
        let gender = if matches_button(text, "btn_male") {
            Gender::Male
        } else if matches_button(text, "btn_female") {
            Gender::Female
        } else {
            return self.reprompt("bad_choice");
        };
        self.draft.gender = Some(gender);
        self.advance(Step::Interest, Vec::new())
    }

    fn on_interest(&mut self, input: Input<'_>) -> Outcome {
        let Input::Text(text) = input else {
            return self.reprompt("bad_choice");
        };
        let interest = if matches_button(text, "btn_girls") {
            Interest::Female
        } else if matches_button(text, "btn_boys") {
            Interest::Male
        } else if matches_button(text, "btn_all") {
            Interest::Both
        } else {
            return self.reprompt("bad_choice");
        };
        self.draft.interest = Some(interest);
        self.advance(Step::City, Vec::new())
    }

    fn on_city(&mut self, input: Input<'_>) -> Outcome {
        match input {
            Input::Text(text) if !text.trim().is_empty() => {
                self.draft.city = Some(gazetteer::normalize(text));
                self.draft.coordinates = gazetteer::coordinates(text);
                self.advance(Step::Name, Vec::new())
            }
            Input::Location {
                latitude,
                longitude,
            } => {
                if let Some(entry) = gazetteer::nearest(latitude, longitude) {
                    self.draft.city = Some(entry.canonical.to_string());
                }
                self.draft.coordinates = Some((latitude, longitude));
                if self.draft.city.is_some() {
                    self.advance(Step::Name, Vec::new())
                } else {
                    // Location far from any known city still needs a name.
                    self.reprompt("ask_city")
                }
            }
            _ => self.reprompt("ask_city"),
        }
    }

    fn on_name(&mut self, input: Input<'_>) -> Outcome {
        let Input::Text(text) = input else {
            return self.reprompt("need_text");
        };
        let text = text.trim();
        if text.is_empty() {
            return self.reprompt("need_text");
        }
        self.draft.name = Some(text.to_string());
        self.advance(Step::Bio, Vec::new())
    }

    fn on_bio(&mut self, input: Input<'_>) -> Outcome {
        let Input::Text(text) = input else {
            return self.reprompt("need_text");
        };
        let text = text.trim();
        if text.is_empty() {
            return self.reprompt("need_text");
        }
        self.draft.bio = Some(text.to_string());
        self.advance(Step::Photo, Vec::new())
    }

    fn on_photo(&mut self, input: Input<'_>) -> Outcome {
        match input {
            Input::Photo(media_id) => {
                if self.draft.photos.len() < MAX_PHOTOS {
                    self.draft.photos.push(media_id.to_string());
                }
                if self.draft.photos.len() >= MAX_PHOTOS {
                    self.advance(Step::Confirm, Vec::new())
                } else {
                    Outcome::replies(vec![Reply::plain(tr(self.lang, "photo_added"))])
                }
            }
            Input::Text(text)
                if matches_button(text, "btn_done") || matches_button(text, "btn_skip") =>
            {
                self.advance(Step::Confirm, Vec::new())
            }
            _ => self.reprompt("need_photo"),
        }
    }

    fn on_confirm(&mut self, input: Input<'_>) -> Outcome {
        let Input::Callback(token) = input else {
            return Outcome::replies(Vec::new());
        };
        match token {
            "confirm_yes" => {
                if self.draft.validate().is_err() {
                    // A stale draft should never pass the gate.
                    return self.reprompt("try_again_later");
                }
                Outcome {
                    replies: vec![Reply::plain(tr(self.lang, "profile_saved"))],
                    effect: Effect::Commit(self.draft.clone()),
                }
            }
            "confirm_change" => {
                self.draft = ProfileDraft::default();
                self.step = Step::Language;
                Outcome::replies(vec![self.prompt()])
            }
            _ => Outcome::replies(Vec::new()),
        }
    }
}

fn lang_from_token(token: &str) -> Option<Lang> {
    token.strip_prefix("lang_").and_then(Lang::from_code)
}

/// Matches a reply-keyboard label in either language, so a switched
/// language mid-flow never strands the user.
fn matches_button(text: &str, key: &'static str) -> bool {
    let text = text.trim();
    text == tr(Lang::Ru, key) || text == tr(Lang::En, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(flow: &mut Onboarding, input: Input<'_>) -> Outcome {
        flow.handle(input)
    }

    #[test]
    fn happy_path_collects_every_field() {
        let (mut flow, _) = Onboarding::start();

        let out = drive(&mut flow, Input::Callback("lang_ru"));
        assert!(matches!(out.effect, Effect::PersistLanguage(Lang::Ru)));
        assert_eq!(flow.step, Step::Age);

        drive(&mut flow, Input::Text("25"));
        assert_eq!(flow.step, Step::Gender);

        drive(&mut flow, Input::Text("Парень"));
        assert_eq!(flow.draft.gender, Some(Gender::Male));

        drive(&mut flow, Input::Text("Девушки"));
        assert_eq!(flow.draft.interest, Some(Interest::Female));

        drive(&mut flow, Input::Text("Москва"));
        assert_eq!(flow.draft.city.as_deref(), Some("Москва"));
        assert_eq!(flow.draft.coordinates, Some((55.7558, 37.6176)));

        drive(&mut flow, Input::Text("Алекс"));
        drive(&mut flow, Input::Text("про меня"));
        assert_eq!(flow.step, Step::Photo);

        drive(&mut flow, Input::Photo("file_1"));
        drive(&mut flow, Input::Text("Готово"));
        assert_eq!(flow.step, Step::Confirm);

        let out = drive(&mut flow, Input::Callback("confirm_yes"));
        let Effect::Commit(draft) = out.effect else {
            panic!("expected commit");
        };
        assert_eq!(draft.age, Some(25));
        assert_eq!(draft.photos, vec!["file_1".to_string()]);
    }

    #[test]
    fn age_is_validated_with_reprompts() {
        let (mut flow, _) = Onboarding::start();
        drive(&mut flow, Input::Callback("lang_en"));

        let out = drive(&mut flow, Input::Text("17"));
        assert_eq!(flow.step, Step::Age);
        assert!(out.replies[0].text.contains("between 18 and 100"));

        drive(&mut flow, Input::Text("abc"));
        assert_eq!(flow.step, Step::Age);

        drive(&mut flow, Input::Text("25"));
        assert_eq!(flow.step, Step::Gender);
    }

    #[test]
    fn third_photo_advances_to_confirm() {
        let (mut flow, _) = Onboarding::start();
        flow.step = Step::Photo;
        drive(&mut flow, Input::Photo("a"));
        drive(&mut flow, Input::Photo("b"));
        assert_eq!(flow.step, Step::Photo);
        drive(&mut flow, Input::Photo("c"));
        assert_eq!(flow.step, Step::Confirm);
        assert_eq!(flow.draft.photos.len(), 3);
    }

    #[test]
    fn confirm_change_restarts_at_language() {
        let (mut flow, _) = Onboarding::start();
        drive(&mut flow, Input::Callback("lang_ru"));
        drive(&mut flow, Input::Text("30"));
        flow.step = Step::Confirm;

        drive(&mut flow, Input::Callback("confirm_change"));
        assert_eq!(flow.step, Step::Language);
        assert!(flow.draft.age.is_none());
    }

    #[test]
    fn resume_jumps_to_first_missing_field() {
        let mut user = User::new(7, None, None);
        user.age = Some(30);
        user.gender = Some(Gender::Female);
        let (flow, _) = Onboarding::resume_from(&user);
        assert_eq!(flow.step, Step::Interest);
    }

    #[test]
    fn language_can_be_switched_mid_flow() {
        let (mut flow, _) = Onboarding::start();
        drive(&mut flow, Input::Callback("lang_ru"));
        drive(&mut flow, Input::Text("25"));
        assert_eq!(flow.step, Step::Gender);

        // A picker callback mid-flow changes the language and repeats the
        // current prompt instead of being fed to the gender step.
        let out = drive(&mut flow, Input::Callback("lang_en"));
        assert!(matches!(out.effect, Effect::PersistLanguage(Lang::En)));
        assert_eq!(flow.step, Step::Gender);
        assert_eq!(flow.lang, Lang::En);
        assert!(out.replies.iter().any(|r| r.text.contains("Your gender?")));
        assert!(!out.replies.iter().any(|r| r.text.contains("keyboard")));

        drive(&mut flow, Input::Text("Guy"));
        assert_eq!(flow.draft.gender, Some(Gender::Male));
    }

    #[test]
    fn language_step_ignores_stray_text() {
        let (mut flow, _) = Onboarding::start();
        let out = drive(&mut flow, Input::Text("hello"));
        assert!(out.replies.is_empty());
        assert_eq!(flow.step, Step::Language);
    }
}
