//! Demo office database.
//!
//! Builds `employees`, `customers`, `products`, `orders` and `order_items`
//! with foreign keys enforced. Data comes from a seeded RNG, so the same
//! options and reference date always produce the same database.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rusqlite::{params, Connection, Transaction};
use std::fs;
use std::path::Path;
use tracing::info;

pub const DEFAULT_DB_PATH: &str = "data/office_rag.db";

const SCHEMA: &str = r#"
CREATE TABLE employees (
    employee_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    phone_number TEXT,
    hire_date TEXT NOT NULL,
    job_title TEXT,
    department TEXT,
    salary REAL,
    manager_id INTEGER REFERENCES employees(employee_id) ON DELETE SET NULL
);

CREATE TABLE customers (
    customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    phone_number TEXT,
    address TEXT,
    city TEXT,
    state TEXT,
    zip_code TEXT,
    registration_date TEXT NOT NULL
);

CREATE TABLE products (
    product_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_name TEXT NOT NULL,
    category TEXT,
    unit_price REAL NOT NULL,
    stock_quantity INTEGER DEFAULT 0
);

CREATE TABLE orders (
    order_id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL REFERENCES customers(customer_id) ON DELETE CASCADE,
    employee_id INTEGER REFERENCES employees(employee_id) ON DELETE SET NULL,
    order_date TEXT NOT NULL,
    status TEXT NOT NULL
);

CREATE TABLE order_items (
    order_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL REFERENCES orders(order_id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES products(product_id) ON DELETE RESTRICT,
    quantity INTEGER NOT NULL,
    price_at_purchase REAL NOT NULL
);
"#;

const DEPARTMENTS: &[(&str, &[&str])] = &[
    ("Sales", &["Sales Manager", "Sales Representative", "Account Executive"]),
    ("Marketing", &["Marketing Manager", "Marketing Specialist", "Content Creator"]),
    (
        "Engineering",
        &["Software Engineer", "Senior Engineer", "Tech Lead", "Engineering Manager"],
    ),
    ("HR", &["HR Manager", "HR Specialist", "Recruiter"]),
    ("Support", &["Support Agent", "Support Lead", "Customer Success Manager"]),
    ("Finance", &["Accountant", "Financial Analyst", "Controller"]),
];

const PRODUCT_CATEGORIES: &[&str] = &[
    "Electronics",
    "Books",
    "Clothing",
    "Home & Kitchen",
    "Sports & Outdoors",
    "Toys & Games",
];

const ORDER_STATUSES: &[&str] = &["Pending", "Processing", "Shipped", "Delivered", "Cancelled"];

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Carlos", "Karen", "Daniel", "Lisa", "Matthew", "Nancy", "Anthony", "Sandra", "Mark", "Ashley",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Clark",
];

const CITIES: &[(&str, &str, &str)] = &[
    ("Springfield", "IL", "627"),
    ("Austin", "TX", "787"),
    ("Portland", "OR", "972"),
    ("Denver", "CO", "802"),
    ("Madison", "WI", "537"),
    ("Raleigh", "NC", "276"),
    ("Tucson", "AZ", "857"),
    ("Boise", "ID", "837"),
];

const STREETS: &[&str] = &["Oak St", "Maple Ave", "Cedar Ln", "Pine Rd", "Elm Dr", "Lake Blvd"];

const PRODUCT_ADJECTIVES: &[&str] = &[
    "Smart", "Compact", "Deluxe", "Portable", "Classic", "Wireless", "Eco", "Ultra",
];

const PRODUCT_NOUNS: &[&str] = &[
    "Speaker", "Backpack", "Notebook", "Blender", "Jacket", "Lamp", "Puzzle", "Bottle", "Monitor",
    "Tent",
];

/// How much data to generate
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub employees: usize,
    pub customers: usize,
    pub products: usize,
    pub orders: usize,
    pub rng_seed: u64,
    /// Dates are generated relative to this day
    pub today: NaiveDate,
}

impl SeedOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            employees: 50,
            customers: 200,
            products: 100,
            orders: 500,
            rng_seed: 42,
            today,
        }
    }
}

/// Row counts written by [`seed_database`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub employees: usize,
    pub customers: usize,
    pub products: usize,
    pub orders: usize,
    pub order_items: usize,
}

struct Employee {
    id: i64,
    department: &'static str,
    job_title: &'static str,
}

struct Product {
    id: i64,
    unit_price: f64,
}

/// Create the demo database at `path`, replacing any existing file
pub fn seed_database(path: &Path, options: &SeedOptions) -> Result<SeedSummary> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove old database {}", path.display()))?;
        info!("Removed old database file {}", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to create database {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("Failed to enable foreign keys")?;

    let mut rng = StdRng::seed_from_u64(options.rng_seed);
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA).context("Failed to create tables")?;

    let employees = insert_employees(&tx, &mut rng, options)?;
    let customers = insert_customers(&tx, &mut rng, options)?;
    let products = insert_products(&tx, &mut rng, options)?;
    let (orders, order_items) =
        insert_orders(&tx, &mut rng, options, &employees, &customers, &products)?;

    tx.commit().context("Failed to commit demo data")?;

    let summary = SeedSummary {
        employees: employees.len(),
        customers: customers.len(),
        products: products.len(),
        orders,
        order_items,
    };
    info!("Seeded {}: {:?}", path.display(), summary);
    Ok(summary)
}

fn person_name(rng: &mut StdRng) -> (&'static str, &'static str) {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Alex");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Doe");
    (first, last)
}

fn email(first: &str, last: &str, n: usize, domain: &str) -> String {
    format!(
        "{}.{}{}@{}",
        first.to_lowercase(),
        last.to_lowercase(),
        n,
        domain
    )
}

fn phone_number(rng: &mut StdRng) -> String {
    format!(
        "({:03}) {:03}-{:04}",
        rng.gen_range(200..1000),
        rng.gen_range(200..1000),
        rng.gen_range(0..10000)
    )
}

fn date_within(rng: &mut StdRng, today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(rng.gen_range(0..days))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn insert_employees(
    tx: &Transaction<'_>,
    rng: &mut StdRng,
    options: &SeedOptions,
) -> Result<Vec<Employee>> {
    let mut employees = Vec::with_capacity(options.employees);

    for n in 1..=options.employees {
        let (department, titles) = DEPARTMENTS[rng.gen_range(0..DEPARTMENTS.len())];
        let job_title = titles[rng.gen_range(0..titles.len())];

        let mut base = 50_000.0;
        if job_title.contains("Manager") {
            base += 30_000.0;
        }
        if job_title.contains("Senior") || job_title.contains("Lead") {
            base += 20_000.0;
        }
        match department {
            "Engineering" => base += 10_000.0,
            "Sales" => base += 5_000.0,
            _ => {}
        }
        let salary = round_cents(rng.gen_range(base * 0.8..base * 1.2));

        let (first, last) = person_name(rng);
        let hire_date = date_within(rng, options.today, 5 * 365);
        tx.execute(
            "INSERT INTO employees (first_name, last_name, email, phone_number, hire_date, job_title, department, salary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                first,
                last,
                email(first, last, n, "office.example.com"),
                phone_number(rng),
                hire_date.format("%Y-%m-%d").to_string(),
                job_title,
                department,
                salary,
            ],
        )?;
        employees.push(Employee {
            id: tx.last_insert_rowid(),
            department,
            job_title,
        });
    }

    assign_managers(tx, rng, &employees)?;
    Ok(employees)
}

/// Managers come from the same department when possible, then any manager,
/// then anyone else.
fn assign_managers(tx: &Transaction<'_>, rng: &mut StdRng, employees: &[Employee]) -> Result<()> {
    for employee in employees {
        let others: Vec<&Employee> = employees.iter().filter(|e| e.id != employee.id).collect();
        let managers: Vec<&Employee> = others
            .iter()
            .copied()
            .filter(|e| e.job_title.contains("Manager"))
            .collect();
        let same_department: Vec<&Employee> = managers
            .iter()
            .copied()
            .filter(|e| e.department == employee.department)
            .collect();

        let pool = if !same_department.is_empty() {
            same_department
        } else if !managers.is_empty() {
            managers
        } else {
            others
        };

        if let Some(manager) = pool.choose(rng) {
            tx.execute(
                "UPDATE employees SET manager_id = ?1 WHERE employee_id = ?2",
                params![manager.id, employee.id],
            )?;
        }
    }
    Ok(())
}

fn insert_customers(
    tx: &Transaction<'_>,
    rng: &mut StdRng,
    options: &SeedOptions,
) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(options.customers);

    for n in 1..=options.customers {
        let (first, last) = person_name(rng);
        let (city, state, zip_prefix) = CITIES[rng.gen_range(0..CITIES.len())];
        let street = STREETS[rng.gen_range(0..STREETS.len())];
        let registration_date = date_within(rng, options.today, 3 * 365);
        tx.execute(
            "INSERT INTO customers (first_name, last_name, email, phone_number, address, city, state, zip_code, registration_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                first,
                last,
                email(first, last, n, "mail.example.org"),
                phone_number(rng),
                format!("{} {}", rng.gen_range(1..9999), street),
                city,
                state,
                format!("{}{:02}", zip_prefix, rng.gen_range(0..100)),
                registration_date.format("%Y-%m-%d").to_string(),
            ],
        )?;
        ids.push(tx.last_insert_rowid());
    }
    Ok(ids)
}

fn insert_products(
    tx: &Transaction<'_>,
    rng: &mut StdRng,
    options: &SeedOptions,
) -> Result<Vec<Product>> {
    let mut products = Vec::with_capacity(options.products);

    for _ in 0..options.products {
        let name = format!(
            "{} {}",
            PRODUCT_ADJECTIVES[rng.gen_range(0..PRODUCT_ADJECTIVES.len())],
            PRODUCT_NOUNS[rng.gen_range(0..PRODUCT_NOUNS.len())]
        );
        let category = PRODUCT_CATEGORIES[rng.gen_range(0..PRODUCT_CATEGORIES.len())];
        let unit_price = round_cents(rng.gen_range(5.0..500.0));
        let stock: i64 = rng.gen_range(0..=1000);
        tx.execute(
            "INSERT INTO products (product_name, category, unit_price, stock_quantity)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, category, unit_price, stock],
        )?;
        products.push(Product {
            id: tx.last_insert_rowid(),
            unit_price,
        });
    }
    Ok(products)
}

/// Returns (orders, order items) written
fn insert_orders(
    tx: &Transaction<'_>,
    rng: &mut StdRng,
    options: &SeedOptions,
    employees: &[Employee],
    customers: &[i64],
    products: &[Product],
) -> Result<(usize, usize)> {
    if customers.is_empty() || products.is_empty() {
        info!("Skipping orders: no customers or products");
        return Ok((0, 0));
    }

    let mut sellers: Vec<i64> = employees
        .iter()
        .filter(|e| matches!(e.department, "Sales" | "Support"))
        .map(|e| e.id)
        .collect();
    if sellers.is_empty() {
        sellers = employees.iter().map(|e| e.id).collect();
    }

    let start = options
        .today
        .and_hms_opt(0, 0, 0)
        .context("Invalid reference date")?;
    let window_secs = 2 * 365 * 24 * 60 * 60;

    let mut orders = 0;
    let mut items = 0;
    for _ in 0..options.orders {
        let Some(&customer_id) = customers.choose(rng) else {
            break;
        };
        let employee_id = sellers.choose(rng).copied();
        let order_date = start - Duration::seconds(rng.gen_range(0..window_secs));
        let status = ORDER_STATUSES[rng.gen_range(0..ORDER_STATUSES.len())];

        tx.execute(
            "INSERT INTO orders (customer_id, employee_id, order_date, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                customer_id,
                employee_id,
                order_date.format("%Y-%m-%d %H:%M:%S").to_string(),
                status,
            ],
        )?;
        let order_id = tx.last_insert_rowid();
        orders += 1;

        let count = rng.gen_range(1..=5).min(products.len());
        for product in products.choose_multiple(rng, count) {
            let quantity: i64 = rng.gen_range(1..=10);
            tx.execute(
                "INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase)
                 VALUES (?1, ?2, ?3, ?4)",
                params![order_id, product.id, quantity, product.unit_price],
            )?;
            items += 1;
        }
    }
    Ok((orders, items))
}
