//! Localized message table for owner and follower notifications.
//!
//! Templates use `{store}` and `{days}` placeholders.

use storekeeper_core::{Locale, NotificationKind};

/// Message keys that can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    Expiration(NotificationKind),
    ListingPublished,
    StoreClosed,
}

const MESSAGES: &[(MessageKey, Locale, &str)] = &[
    (
        MessageKey::Expiration(NotificationKind::Warning),
        Locale::En,
        "Your store \"{store}\" expires in {days} day(s). Renew your plan to keep your listings visible.",
    ),
    (
        MessageKey::Expiration(NotificationKind::Warning),
        Locale::Es,
        "Tu tienda \"{store}\" vence en {days} día(s). Renueva tu plan para que tus anuncios sigan visibles.",
    ),
    (
        MessageKey::Expiration(NotificationKind::GracePeriod),
        Locale::En,
        "Your store \"{store}\" has expired. It stays visible for {days} more day(s) while you renew.",
    ),
    (
        MessageKey::Expiration(NotificationKind::GracePeriod),
        Locale::Es,
        "Tu tienda \"{store}\" ha vencido. Seguirá visible {days} día(s) más mientras la renuevas.",
    ),
    (
        MessageKey::Expiration(NotificationKind::Deactivated),
        Locale::En,
        "Your store \"{store}\" has been deactivated. Reactivate it to publish listings again.",
    ),
    (
        MessageKey::Expiration(NotificationKind::Deactivated),
        Locale::Es,
        "Tu tienda \"{store}\" ha sido desactivada. Reactívala para volver a publicar anuncios.",
    ),
    (
        MessageKey::ListingPublished,
        Locale::En,
        "\"{store}\" just published a new listing.",
    ),
    (
        MessageKey::ListingPublished,
        Locale::Es,
        "\"{store}\" acaba de publicar un nuevo anuncio.",
    ),
    (
        MessageKey::StoreClosed,
        Locale::En,
        "\"{store}\" has closed.",
    ),
    (
        MessageKey::StoreClosed,
        Locale::Es,
        "\"{store}\" ha cerrado.",
    ),
];

/// Render a message in `locale`, falling back to English.
#[must_use]
pub fn render(key: MessageKey, locale: Locale, store_name: &str, days: i64) -> String {
    let template = lookup(key, locale)
        .or_else(|| lookup(key, Locale::En))
        .unwrap_or("{store}");
    template
        .replace("{store}", store_name)
        .replace("{days}", &days.to_string())
}

fn lookup(key: MessageKey, locale: Locale) -> Option<&'static str> {
    MESSAGES
        .iter()
        .find(|(k, l, _)| *k == key && *l == locale)
        .map(|(_, _, template)| *template)
}
