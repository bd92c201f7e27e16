//! Inline keyboard builders
//!
//! Callback data formats are colon-separated, e.g. `cart:add:<product>:<qty>`
//! or `flavor:add:<product>:<flavor>:<qty>`; the router in `schema.rs` splits
//! on the prefix.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::storage::catalog::{Category, Flavor, Product};
use crate::storage::managers::Manager;

/// Главное меню: каталог, корзина, информация и (для админов) панель.
pub fn main_menu(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![
            InlineKeyboardButton::callback("🏷️ Каталог", "catalog:open"),
            InlineKeyboardButton::callback("🛒 Корзина", "cart:view"),
        ],
        vec![InlineKeyboardButton::callback("ℹ️ О нас", "info:open")],
    ];
    if is_admin {
        rows.push(vec![InlineKeyboardButton::callback("⚙️ Админ", "admin:open")]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn categories(categories: &[Category]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for pair in categories.chunks(2) {
        rows.push(
            pair.iter()
                .map(|c| InlineKeyboardButton::callback(format!("📂 {}", c.name), format!("category:{}", c.id)))
                .collect(),
        );
    }
    rows.push(vec![InlineKeyboardButton::callback("🏠 Главная", "nav:home")]);
    InlineKeyboardMarkup::new(rows)
}

pub fn products(products: &[Product]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = products
        .iter()
        .map(|p| {
            vec![InlineKeyboardButton::callback(
                format!("📦 {}", p.title),
                format!("product:{}", p.id),
            )]
        })
        .collect();
    rows.push(vec![
        InlineKeyboardButton::callback("⬅️ К категориям", "nav:categories"),
        InlineKeyboardButton::callback("🏠 Главная", "nav:home"),
    ]);
    InlineKeyboardMarkup::new(rows)
}

/// Карточка товара: счётчик количества, затем либо кнопка корзины, либо —
/// для товаров со вкусами — обязательный шаг выбора вкуса.
pub fn product_view(product: &Product, qty: i64, has_flavors: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![qty_row(&format!("qty:dec:{}:{qty}", product.id), qty, &format!("qty:inc:{}:{qty}", product.id))];

    if has_flavors {
        rows.push(vec![InlineKeyboardButton::callback(
            "🍃 Выбрать вкус",
            format!("flavor:select:{}:{qty}", product.id),
        )]);
        rows.push(vec![InlineKeyboardButton::callback("❌ Сначала выберите вкус", "noop")]);
    } else if product.in_stock {
        rows.push(vec![InlineKeyboardButton::callback(
            "🛒 В корзину",
            format!("cart:add:{}:{qty}", product.id),
        )]);
    } else {
        rows.push(vec![InlineKeyboardButton::callback("❌ Нет в наличии", "noop")]);
    }

    rows.push(back_row(product.category_id));
    InlineKeyboardMarkup::new(rows)
}

/// Список вкусов товара.
pub fn flavor_list(product_id: i64, qty: i64, flavors: &[Flavor]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = flavors
        .iter()
        .map(|f| {
            vec![InlineKeyboardButton::callback(
                format!("🍃 {}", f.name),
                format!("flavor:set:{product_id}:{}:{qty}", f.id),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "⬅️ Назад к товару",
        format!("product:{product_id}"),
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// Карточка товара с выбранным вкусом: корзина доступна.
pub fn flavor_view(product: &Product, flavor_id: i64, qty: i64) -> InlineKeyboardMarkup {
    let pid = product.id;
    let mut rows = vec![qty_row(
        &format!("flavor:qty:dec:{pid}:{flavor_id}:{qty}"),
        qty,
        &format!("flavor:qty:inc:{pid}:{flavor_id}:{qty}"),
    )];

    if product.in_stock {
        rows.push(vec![InlineKeyboardButton::callback(
            "🛒 В корзину",
            format!("flavor:add:{pid}:{flavor_id}:{qty}"),
        )]);
    } else {
        rows.push(vec![InlineKeyboardButton::callback("❌ Нет в наличии", "noop")]);
    }

    rows.push(vec![InlineKeyboardButton::callback(
        "🍃 Изменить вкус",
        format!("flavor:select:{pid}:{qty}"),
    )]);
    rows.push(vec![InlineKeyboardButton::callback(
        "⬅️ Назад к товару",
        format!("product:{pid}"),
    )]);
    InlineKeyboardMarkup::new(rows)
}

fn qty_row(dec: &str, qty: i64, inc: &str) -> Vec<InlineKeyboardButton> {
    vec![
        InlineKeyboardButton::callback("➖", dec),
        InlineKeyboardButton::callback(qty.to_string(), "noop"),
        InlineKeyboardButton::callback("➕", inc),
    ]
}

fn back_row(category_id: Option<i64>) -> Vec<InlineKeyboardButton> {
    match category_id {
        Some(cid) => vec![
            InlineKeyboardButton::callback("⬅️ К товарам", format!("nav:category:{cid}")),
            InlineKeyboardButton::callback("🏠 Главная", "nav:home"),
        ],
        None => vec![
            InlineKeyboardButton::callback("⬅️ К категориям", "nav:categories"),
            InlineKeyboardButton::callback("🏠 Главная", "nav:home"),
        ],
    }
}

pub fn cart_actions() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("✅ Оформить", "cart:checkout"),
            InlineKeyboardButton::callback("🧹 Очистить", "cart:clear"),
        ],
        vec![
            InlineKeyboardButton::callback("🏷️ Каталог", "catalog:open"),
            InlineKeyboardButton::callback("🏠 Главная", "nav:home"),
        ],
    ])
}

pub fn info_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("ℹ️ О нас", "info:item:about")],
        vec![InlineKeyboardButton::callback("🎁 Упаковка", "info:item:packaging")],
        vec![InlineKeyboardButton::callback(
            "💸 Скидки для оптовиков",
            "info:item:wholesale",
        )],
        vec![InlineKeyboardButton::callback(
            "📱 Почему запрашиваем телефон и адрес",
            "info:item:privacy",
        )],
        vec![InlineKeyboardButton::callback("⭐ Отзывы", "info:item:reviews")],
        vec![InlineKeyboardButton::callback("🏠 Главная", "nav:home")],
    ])
}

pub fn info_item() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("⬅️ К разделу 'ℹ️ О нас'", "info:open"),
        InlineKeyboardButton::callback("🏠 Главная", "nav:home"),
    ]])
}

// --- Админские клавиатуры ---

pub fn admin_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("➕📦 Товар", "admin:product:add"),
            InlineKeyboardButton::callback("➕📂 Категория", "admin:category:add"),
        ],
        vec![
            InlineKeyboardButton::callback("📋 Категории", "admin:category:list"),
            InlineKeyboardButton::callback("📦 Товары", "admin:products"),
        ],
        vec![InlineKeyboardButton::callback("🗃 Архив товаров", "admin:products:archived")],
        vec![
            InlineKeyboardButton::callback("⭐ Добавить отзыв", "admin:review:add"),
            InlineKeyboardButton::callback("🗂 Отзывы", "admin:reviews"),
        ],
        vec![InlineKeyboardButton::callback("🎨 Брендинг", "admin:branding")],
        vec![InlineKeyboardButton::callback("👥 Менеджеры", "admin:managers")],
        vec![InlineKeyboardButton::callback("🏠 Главная", "nav:home")],
    ])
}

pub fn admin_products(products: &[Product]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = products
        .iter()
        .map(|p| {
            vec![InlineKeyboardButton::callback(
                format!("📦 {}", p.title),
                format!("adminprod:{}", p.id),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("↩️ Назад", "admin:open")]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_archived_products(products: &[Product]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = products
        .iter()
        .map(|p| {
            vec![
                InlineKeyboardButton::callback(format!("📦 {}", p.title), "noop"),
                InlineKeyboardButton::callback("♻️ Вернуть", format!("admin:product:restore:{}", p.id)),
            ]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("↩️ Назад", "admin:open")]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_product_edit(product_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("✏️ Название", format!("admin:edit:title:{product_id}")),
            InlineKeyboardButton::callback("📝 Описание", format!("admin:edit:desc:{product_id}")),
        ],
        vec![
            InlineKeyboardButton::callback("💵 Цена", format!("admin:edit:price:{product_id}")),
            InlineKeyboardButton::callback("📦 Остаток", format!("admin:edit:stock:{product_id}")),
        ],
        vec![
            InlineKeyboardButton::callback("💰 Опт. цена", format!("admin:edit:bulk_price:{product_id}")),
            InlineKeyboardButton::callback("📈 Опт. порог", format!("admin:edit:bulk_threshold:{product_id}")),
        ],
        vec![
            InlineKeyboardButton::callback("🏷 Категория", format!("admin:edit:category:{product_id}")),
            InlineKeyboardButton::callback("🔄 Наличие", format!("admin:edit:toggle_instock:{product_id}")),
        ],
        vec![InlineKeyboardButton::callback("🍃 Вкусы", format!("admin:edit:flavors:{product_id}"))],
        vec![InlineKeyboardButton::callback(
            "🗃 В архив",
            format!("admin:product:delete:{product_id}"),
        )],
        vec![InlineKeyboardButton::callback("↩️ Назад", "admin:products")],
    ])
}

/// Выбор категории в мастере создания товара.
pub fn admin_categories_pick(categories: &[Category]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = categories
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|c| InlineKeyboardButton::callback(format!("📂 {}", c.name), format!("admincat:{}", c.id)))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Выбор новой категории при редактировании товара.
pub fn admin_categories_reassign(product_id: i64, categories: &[Category]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = categories
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|c| {
                    InlineKeyboardButton::callback(
                        format!("📂 {}", c.name),
                        format!("admincatset:{product_id}:{}", c.id),
                    )
                })
                .collect()
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "↩️ Назад",
        format!("adminprod:{product_id}"),
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_availability() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ В наличии", "admin:availability:yes"),
        InlineKeyboardButton::callback("❌ Нет в наличии", "admin:availability:no"),
    ]])
}

pub fn admin_flavors(product_id: i64, flavors: &[Flavor]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = flavors
        .iter()
        .map(|f| {
            vec![InlineKeyboardButton::callback(
                format!("🍃 {} {}", f.name, if f.is_available { "✅" } else { "❌" }),
                format!("admin:flavor:toggle:{product_id}:{}", f.id),
            )]
        })
        .collect();
    if !flavors.is_empty() {
        rows.push(vec![InlineKeyboardButton::callback(
            "🗑 Удалить все",
            format!("admin:flavor:delete:{product_id}"),
        )]);
    }
    rows.push(vec![
        InlineKeyboardButton::callback("➕ Добавить вкус", format!("admin:flavor:add:{product_id}")),
        InlineKeyboardButton::callback("↩️ Назад", format!("adminprod:{product_id}")),
    ]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_managers(managers: &[Manager]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = managers
        .iter()
        .map(|m| {
            vec![
                InlineKeyboardButton::callback(format!("👤 {}", m.user_id), "noop"),
                InlineKeyboardButton::callback("🗑 Удалить", format!("admin:managers:del:{}", m.user_id)),
            ]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("➕ Добавить", "admin:managers:add")]);
    rows.push(vec![InlineKeyboardButton::callback("↩️ Назад", "admin:open")]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_branding() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("🖼 Задать логотип", "admin:branding:set_logo"),
            InlineKeyboardButton::callback("✏️ Изменить приветствие", "admin:branding:set_text"),
        ],
        vec![InlineKeyboardButton::callback("↩️ Назад", "admin:open")],
    ])
}
