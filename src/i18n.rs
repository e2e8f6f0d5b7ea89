// src/i18n.rs

//! Localized string lookup.
//!
//! Tables are immutable after startup. Lookup order: requested language,
//! then Russian (the default), then the key itself so a missing entry is
//! visible instead of crashing.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::Lang;

static RU: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| TABLE_RU.iter().copied().collect());

static EN: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| TABLE_EN.iter().copied().collect());

pub fn tr(lang: Lang, key: &'static str) -> &'static str {
    let table = match lang {
        Lang::Ru => &RU,
        Lang::En => &EN,
    };
    table
        .get(key)
        .or_else(|| RU.get(key))
        .copied()
        .unwrap_or(key)
}

const TABLE_RU: &[(&str, &str)] = &[
    ("choose_language", "Выберите язык / Choose your language:"),
    ("language_set", "Язык сохранён."),
    (
        "welcome",
        "Добро пожаловать в ALT3R — знакомства для нейроотличных людей! Давайте заполним анкету.",
    ),
    ("ask_age", "Сколько вам лет?"),
    ("bad_age", "Пожалуйста, введите возраст числом от 18 до 100."),
    ("ask_gender", "Ваш пол?"),
    ("btn_male", "Парень"),
    ("btn_female", "Девушка"),
    ("bad_choice", "Пожалуйста, выберите вариант на клавиатуре."),
    ("ask_interest", "Кто вам интересен?"),
    ("btn_girls", "Девушки"),
    ("btn_boys", "Парни"),
    ("btn_all", "Все"),
    ("ask_city", "Из какого вы города? Можно отправить геолокацию."),
    ("btn_send_location", "Отправить геолокацию"),
    ("ask_name", "Как вас зовут?"),
    ("ask_bio", "Расскажите о себе пару слов."),
    ("need_text", "Пожалуйста, отправьте текст."),
    (
        "ask_photo",
        "Пришлите до 3 фото. Нажмите «Готово», когда закончите, или «Пропустить».",
    ),
    ("btn_skip", "Пропустить"),
    ("btn_done", "Готово"),
    ("photo_added", "Фото добавлено."),
    ("need_photo", "Пришлите фото или нажмите кнопку."),
    ("confirm_header", "Проверьте анкету:"),
    ("btn_confirm_yes", "Всё верно"),
    ("btn_confirm_change", "Заполнить заново"),
    ("profile_saved", "Анкета сохранена! Приятных знакомств."),
    ("main_menu", "Главное меню:"),
    ("btn_menu_profile", "Моя анкета"),
    ("btn_menu_browse", "Смотреть анкеты"),
    ("btn_menu_neurosearch", "Нейропоиск"),
    ("btn_menu_change_photo", "Изменить фото"),
    ("btn_menu_change_bio", "Изменить описание"),
    ("btn_menu_likes", "Мои симпатии"),
    ("btn_menu_settings", "Настройки"),
    ("btn_menu_feedback", "Обратная связь"),
    ("no_candidates", "Пока нет подходящих анкет. Загляните позже!"),
    ("like_sent", "Симпатия отправлена."),
    ("its_a_match", "Это взаимно! Вы понравились друг другу:"),
    ("skipped", "Пропущено."),
    ("new_like", "Вы кому-то понравились!"),
    ("new_likes_count", "Новых симпатий:"),
    ("btn_like", "❤️"),
    ("btn_pass", "👎"),
    ("btn_report", "⚠️ Пожаловаться"),
    ("btn_back", "В меню"),
    ("report_thanks", "Спасибо, жалоба принята."),
    ("likes_none", "Пока никто не поставил вам симпатию."),
    ("likes_header", "Вас лайкнули:"),
    ("settings_header", "Настройки:"),
    ("btn_change_language", "Язык"),
    ("btn_donate", "Поддержать проект"),
    ("feedback_prompt", "Напишите ваше сообщение, мы его обязательно прочитаем."),
    ("feedback_thanks", "Спасибо за обратную связь!"),
    ("bio_prompt", "Пришлите новое описание."),
    ("bio_saved", "Описание обновлено."),
    ("photo_prompt", "Пришлите новое фото."),
    ("photo_saved", "Фото обновлено."),
    ("donate_intro", "Спасибо, что хотите поддержать ALT3R! Выберите способ:"),
    ("btn_pay_stars", "Telegram Stars"),
    ("btn_pay_ton", "TON"),
    ("choose_stars_amount", "Сколько звёзд отправить?"),
    ("choose_ton_amount", "Сколько TON отправить?"),
    ("btn_custom_amount", "Другая сумма"),
    ("stars_custom_prompt", "Введите количество звёзд (минимум 10)."),
    ("ton_custom_prompt", "Введите сумму в TON (минимум 0.1)."),
    ("invalid_amount", "Не получилось распознать сумму, попробуйте ещё раз."),
    ("invoice_title", "Поддержка ALT3R"),
    ("invoice_description", "Добровольное пожертвование на развитие проекта."),
    ("payment_failed", "Платёж не прошёл. Попробуйте ещё раз."),
    ("payment_thanks", "Спасибо за поддержку! 💜"),
    (
        "ton_instructions",
        "Переведите указанную сумму на кошелёк и обязательно укажите комментарий — по нему мы найдём ваш перевод. Заявка действует 1 час.",
    ),
    (
        "help",
        "Команды: /start — начать, /help — помощь, /language — сменить язык.",
    ),
    ("try_again_later", "Что-то пошло не так. Попробуйте позже."),
    (
        "traits_prompt",
        "Отметьте, какие черты вы ищете в людях, и нажмите «Готово».",
    ),
    ("btn_traits_done", "Готово"),
    ("traits_saved", "Предпочтения сохранены."),
    ("profile_incomplete", "Сначала заполните анкету: /start"),
    ("trait_adhd", "СДВГ"),
    ("trait_autism", "Аутизм"),
    ("trait_anxiety", "Тревожность"),
    ("trait_depression", "Депрессия"),
    ("trait_bipolar", "БАР"),
    ("trait_ocd", "ОКР"),
    ("trait_ptsd", "ПТСР"),
    ("trait_sensory", "Сенсорные особенности"),
    ("trait_dyslexia", "Дислексия"),
    ("trait_highly_sensitive", "Высокая чувствительность"),
    ("trait_introvert", "Интроверт"),
    ("trait_empath", "Эмпат"),
    ("trait_creative", "Креативность"),
    ("trait_none", "Не указано"),
];

const TABLE_EN: &[(&str, &str)] = &[
    ("choose_language", "Выберите язык / Choose your language:"),
    ("language_set", "Language saved."),
    (
        "welcome",
        "Welcome to ALT3R — dating for neurodivergent people! Let's fill in your profile.",
    ),
    ("ask_age", "How old are you?"),
    ("bad_age", "Please send your age as a number between 18 and 100."),
    ("ask_gender", "Your gender?"),
    ("btn_male", "Guy"),
    ("btn_female", "Girl"),
    ("bad_choice", "Please pick an option from the keyboard."),
    ("ask_interest", "Who are you interested in?"),
    ("btn_girls", "Girls"),
    ("btn_boys", "Guys"),
    ("btn_all", "Everyone"),
    ("ask_city", "What city are you from? You can also share your location."),
    ("btn_send_location", "Share location"),
    ("ask_name", "What's your name?"),
    ("ask_bio", "Tell us a few words about yourself."),
    ("need_text", "Please send some text."),
    (
        "ask_photo",
        "Send up to 3 photos. Tap \"Done\" when finished, or \"Skip\".",
    ),
    ("btn_skip", "Skip"),
    ("btn_done", "Done"),
    ("photo_added", "Photo added."),
    ("need_photo", "Send a photo or use the buttons."),
    ("confirm_header", "Check your profile:"),
    ("btn_confirm_yes", "Looks good"),
    ("btn_confirm_change", "Start over"),
    ("profile_saved", "Profile saved! Happy matching."),
    ("main_menu", "Main menu:"),
    ("btn_menu_profile", "My profile"),
    ("btn_menu_browse", "Browse profiles"),
    ("btn_menu_neurosearch", "Neurosearch"),
    ("btn_menu_change_photo", "Change photo"),
    ("btn_menu_change_bio", "Change bio"),
    ("btn_menu_likes", "My likes"),
    ("btn_menu_settings", "Settings"),
    ("btn_menu_feedback", "Feedback"),
    ("no_candidates", "No profiles available right now. Check back later!"),
    ("like_sent", "Like sent."),
    ("its_a_match", "It's a match! You liked each other:"),
    ("skipped", "Skipped."),
    ("new_like", "Someone liked you!"),
    ("new_likes_count", "New likes:"),
    ("btn_like", "❤️"),
    ("btn_pass", "👎"),
    ("btn_report", "⚠️ Report"),
    ("btn_back", "Back to menu"),
    ("report_thanks", "Thanks, the report was recorded."),
    ("likes_none", "Nobody has liked you yet."),
    ("likes_header", "You were liked by:"),
    ("settings_header", "Settings:"),
    ("btn_change_language", "Language"),
    ("btn_donate", "Support the project"),
    ("feedback_prompt", "Write your message and we will definitely read it."),
    ("feedback_thanks", "Thank you for the feedback!"),
    ("bio_prompt", "Send your new bio."),
    ("bio_saved", "Bio updated."),
    ("photo_prompt", "Send your new photo."),
    ("photo_saved", "Photo updated."),
    ("donate_intro", "Thank you for supporting ALT3R! Pick a method:"),
    ("btn_pay_stars", "Telegram Stars"),
    ("btn_pay_ton", "TON"),
    ("choose_stars_amount", "How many stars would you like to send?"),
    ("choose_ton_amount", "How much TON would you like to send?"),
    ("btn_custom_amount", "Custom amount"),
    ("stars_custom_prompt", "Enter the number of stars (minimum 10)."),
    ("ton_custom_prompt", "Enter the amount in TON (minimum 0.1)."),
    ("invalid_amount", "Couldn't parse that amount, please try again."),
    ("invoice_title", "Support ALT3R"),
    ("invoice_description", "A voluntary donation towards the project."),
    ("payment_failed", "The payment didn't go through. Please try again."),
    ("payment_thanks", "Thank you for your support! 💜"),
    (
        "ton_instructions",
        "Transfer the exact amount to the wallet below and include the comment — that's how we match your transfer. The request is valid for 1 hour.",
    ),
    (
        "help",
        "Commands: /start — begin, /help — this message, /language — change language.",
    ),
    ("try_again_later", "Something went wrong. Please try again later."),
    (
        "traits_prompt",
        "Mark the traits you are looking for in others, then tap \"Done\".",
    ),
    ("btn_traits_done", "Done"),
    ("traits_saved", "Preferences saved."),
    ("profile_incomplete", "Please finish your profile first: /start"),
    ("trait_adhd", "ADHD"),
    ("trait_autism", "Autism"),
    ("trait_anxiety", "Anxiety"),
    ("trait_depression", "Depression"),
    ("trait_bipolar", "Bipolar"),
    ("trait_ocd", "OCD"),
    ("trait_ptsd", "PTSD"),
    ("trait_sensory", "Sensory sensitivities"),
    ("trait_dyslexia", "Dyslexia"),
    ("trait_highly_sensitive", "Highly sensitive"),
    ("trait_introvert", "Introvert"),
    ("trait_empath", "Empath"),
    ("trait_creative", "Creative"),
    ("trait_none", "Not specified"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_prefers_requested_language() {
        assert_eq!(tr(Lang::En, "skipped"), "Skipped.");
        assert_eq!(tr(Lang::Ru, "skipped"), "Пропущено.");
    }

    #[test]
    fn missing_english_entry_falls_back_to_russian_then_key() {
        assert_eq!(tr(Lang::En, "no_such_key"), "no_such_key");
    }

    #[test]
    fn every_russian_key_has_an_english_entry() {
        for (key, _) in TABLE_RU {
            assert!(EN.contains_key(key), "missing en translation for {}", key);
        }
    }
}
