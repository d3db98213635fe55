//! # Records
//!
//! The people, places and menu entries an order refers to. These are plain
//! records with validated setters; the rules engine only reads them
//! (`Food::price`, `Food::id`, user and restaurant ids).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   User ──(role)──► Customer { cart } | HotelManager                     │
//! │    │                                                                    │
//! │    ├── addresses: Vec<Address>                                          │
//! │    └── place_order(restaurant, foods) ──► Order (Pending)               │
//! │                                                                         │
//! │   Restaurant ── menu: Vec<Food> ── prepare_order(order) ──► Preparing   │
//! │                                                                         │
//! │   Delivery (address, courier, ETA)      Rating (1-5 stars, comment)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::ids::IdGenerator;
use crate::money::Money;
use crate::order::{Order, OrderStatus, StatusChange};
use crate::validation::{
    validate_email, validate_name, validate_price, validate_rating, validate_zip_code,
    ValidationResult,
};

// =============================================================================
// Address
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Address {
    pub id: u64,
    line1: String,
    line2: Option<String>,
    street: String,
    city: String,
    state: String,
    zip_code: String,
}

impl Address {
    pub fn new(
        id: u64,
        line1: impl Into<String>,
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> ValidationResult<Self> {
        let mut address = Address {
            id,
            line1: String::new(),
            line2: None,
            street: street.into(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
        };
        address.update_line1(line1)?;
        address.update_city(city)?;
        address.update_state(state)?;
        address.update_zip_code(zip_code)?;
        Ok(address)
    }

    pub fn with_line2(mut self, line2: impl Into<String>) -> Self {
        self.line2 = Some(line2.into());
        self
    }

    pub fn line1(&self) -> &str {
        &self.line1
    }

    pub fn line2(&self) -> Option<&str> {
        self.line2.as_deref()
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }

    pub fn update_line1(&mut self, line: impl Into<String>) -> ValidationResult<()> {
        let line = line.into();
        validate_name("address_line1", &line)?;
        self.line1 = line;
        Ok(())
    }

    pub fn update_city(&mut self, city: impl Into<String>) -> ValidationResult<()> {
        let city = city.into();
        validate_name("city", &city)?;
        self.city = city;
        Ok(())
    }

    pub fn update_state(&mut self, state: impl Into<String>) -> ValidationResult<()> {
        let state = state.into();
        validate_name("state", &state)?;
        self.state = state;
        Ok(())
    }

    pub fn update_zip_code(&mut self, zip: impl Into<String>) -> ValidationResult<()> {
        let zip = zip.into();
        validate_zip_code(&zip)?;
        self.zip_code = zip.trim().to_string();
        Ok(())
    }
}

// =============================================================================
// Food
// =============================================================================

/// A menu entry.
///
/// `quantity` is a free-text serving descriptor ("2 slices", "500 ml"), not a
/// count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Food {
    id: u64,
    name: String,
    quantity: String,
    price: Money,
}

impl Food {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        quantity: impl Into<String>,
        price: Money,
    ) -> ValidationResult<Self> {
        let name = name.into();
        validate_name("name", &name)?;
        validate_price(price)?;
        Ok(Food {
            id,
            name,
            quantity: quantity.into(),
            price,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn update_quantity(&mut self, quantity: impl Into<String>) {
        self.quantity = quantity.into();
    }

    /// Changes the menu price. Order lines that already captured the old
    /// price are not affected.
    pub fn update_price(&mut self, price: Money) -> ValidationResult<()> {
        validate_price(price)?;
        self.price = price;
        Ok(())
    }
}

// =============================================================================
// User
// =============================================================================

/// What a user can do on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum UserRole {
    /// Orders food; keeps a cart of menu entries between orders.
    Customer { cart: Vec<Food> },
    /// Runs a restaurant.
    HotelManager,
}

impl UserRole {
    pub fn customer() -> Self {
        UserRole::Customer { cart: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    id: u64,
    name: String,
    email: String,
    addresses: Vec<Address>,
    role: UserRole,
}

impl User {
    /// Registers a user. Name and email are validated.
    pub fn register(
        id: u64,
        name: impl Into<String>,
        email: impl Into<String>,
        addresses: Vec<Address>,
        role: UserRole,
    ) -> ValidationResult<Self> {
        let name = name.into();
        let email = email.into();
        validate_name("name", &name)?;
        validate_email(&email)?;
        Ok(User {
            id,
            name,
            email: email.trim().to_string(),
            addresses,
            role,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn role(&self) -> &UserRole {
        &self.role
    }

    pub fn is_customer(&self) -> bool {
        matches!(self.role, UserRole::Customer { .. })
    }

    pub fn update_name(&mut self, name: impl Into<String>) -> ValidationResult<()> {
        let name = name.into();
        validate_name("name", &name)?;
        self.name = name;
        Ok(())
    }

    pub fn update_email(&mut self, email: impl Into<String>) -> ValidationResult<()> {
        let email = email.into();
        validate_email(&email)?;
        self.email = email.trim().to_string();
        Ok(())
    }

    pub fn add_address(&mut self, address: Address) {
        self.addresses.push(address);
    }

    /// Removes every address with `address_id`; returns whether any matched.
    pub fn remove_address(&mut self, address_id: u64) -> bool {
        let before = self.addresses.len();
        self.addresses.retain(|a| a.id != address_id);
        self.addresses.len() != before
    }

    /// The customer's cart, `None` for roles without one.
    pub fn cart(&self) -> Option<&[Food]> {
        match &self.role {
            UserRole::Customer { cart } => Some(cart),
            UserRole::HotelManager => None,
        }
    }

    /// Puts a snapshot of `food` in the cart. Returns false for roles
    /// without a cart.
    pub fn add_to_cart(&mut self, food: &Food) -> bool {
        match &mut self.role {
            UserRole::Customer { cart } => {
                cart.push(food.clone());
                true
            }
            UserRole::HotelManager => false,
        }
    }

    pub fn clear_cart(&mut self) {
        if let UserRole::Customer { cart } = &mut self.role {
            cart.clear();
        }
    }

    /// Opens a Pending order at `restaurant` with one line per food, each
    /// using the food's own quantity descriptor and current price.
    pub fn place_order(
        &self,
        order_id: u64,
        restaurant: &Restaurant,
        items: &[Food],
        description: impl Into<String>,
        ids: &dyn IdGenerator,
        now: DateTime<Utc>,
    ) -> Order {
        let mut order = Order::new(order_id, self.id, restaurant.id(), description, now);
        for food in items {
            order.add_item(food, food.quantity(), ids);
        }
        order
    }
}

// =============================================================================
// Restaurant
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Restaurant {
    id: u64,
    name: String,
    addresses: Vec<Address>,
    menu: Vec<Food>,
}

impl Restaurant {
    pub fn new(id: u64, name: impl Into<String>, addresses: Vec<Address>) -> ValidationResult<Self> {
        let name = name.into();
        validate_name("name", &name)?;
        Ok(Restaurant {
            id,
            name,
            addresses,
            menu: Vec::new(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn menu(&self) -> &[Food] {
        &self.menu
    }

    pub fn menu_item(&self, food_id: u64) -> Option<&Food> {
        self.menu.iter().find(|f| f.id() == food_id)
    }

    pub fn add_menu_item(&mut self, food: Food) {
        self.menu.push(food);
    }

    /// Removes the menu entry; returns whether it was there.
    pub fn remove_menu_item(&mut self, food_id: u64) -> bool {
        let before = self.menu.len();
        self.menu.retain(|f| f.id() != food_id);
        self.menu.len() != before
    }

    /// Reprices a menu entry. `Ok(false)` when no entry has `food_id`.
    pub fn update_menu_item_price(&mut self, food_id: u64, price: Money) -> ValidationResult<bool> {
        match self.menu.iter_mut().find(|f| f.id() == food_id) {
            Some(food) => {
                food.update_price(price)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Starts preparing one of this restaurant's orders.
    ///
    /// ## Errors
    /// - `ForeignOrder` if the order was placed at another restaurant
    pub fn prepare_order(&self, order: &mut Order) -> CoreResult<StatusChange> {
        if order.restaurant_id() != self.id {
            return Err(CoreError::ForeignOrder {
                order_id: order.id(),
                restaurant_id: self.id,
            });
        }
        order.update_status(OrderStatus::Preparing)
    }
}

// =============================================================================
// Delivery
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Delivery {
    pub id: u64,
    pub order_id: u64,
    pub delivery_address: Address,
    pub person_name: Option<String>,
    pub person_contact: Option<String>,
    #[ts(as = "Option<String>")]
    pub estimated_delivery_time: Option<DateTime<Utc>>,
}

impl Delivery {
    pub fn new(id: u64, order_id: u64, delivery_address: Address) -> Self {
        Delivery {
            id,
            order_id,
            delivery_address,
            person_name: None,
            person_contact: None,
            estimated_delivery_time: None,
        }
    }

    pub fn assign_delivery_person(
        &mut self,
        name: impl Into<String>,
        contact: impl Into<String>,
    ) -> ValidationResult<()> {
        let name = name.into();
        let contact = contact.into();
        validate_name("delivery_person_name", &name)?;
        validate_name("delivery_person_contact", &contact)?;
        self.person_name = Some(name);
        self.person_contact = Some(contact);
        Ok(())
    }

    pub fn update_estimated_time(&mut self, time: DateTime<Utc>) {
        self.estimated_delivery_time = Some(time);
    }

    pub fn is_assigned(&self) -> bool {
        self.person_name.is_some()
    }
}

// =============================================================================
// Rating
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rating {
    id: u64,
    stars: u8,
    comment: String,
    user_id: u64,
    restaurant_id: u64,
    #[ts(as = "String")]
    review_date: DateTime<Utc>,
}

impl Rating {
    pub fn new(
        id: u64,
        stars: u8,
        comment: impl Into<String>,
        user_id: u64,
        restaurant_id: u64,
        review_date: DateTime<Utc>,
    ) -> ValidationResult<Self> {
        validate_rating(stars)?;
        Ok(Rating {
            id,
            stars,
            comment: comment.into(),
            user_id,
            restaurant_id,
            review_date,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn stars(&self) -> u8 {
        self.stars
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn restaurant_id(&self) -> u64 {
        self.restaurant_id
    }

    pub fn review_date(&self) -> DateTime<Utc> {
        self.review_date
    }

    /// Replaces stars and comment, re-dating the review.
    pub fn update_rating(
        &mut self,
        stars: u8,
        comment: impl Into<String>,
        now: DateTime<Utc>,
    ) -> ValidationResult<()> {
        validate_rating(stars)?;
        self.stars = stars;
        self.comment = comment.into();
        self.review_date = now;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 19, 30, 0).unwrap()
    }

    fn home() -> Address {
        Address::new(1, "Flat 4B", "MG Road", "Bengaluru", "KA", "560001").unwrap()
    }

    fn pizza() -> Food {
        Food::new(10, "Margherita", "1 large", Money::from_cents(1000)).unwrap()
    }

    fn soda() -> Food {
        Food::new(11, "Soda", "330 ml", Money::from_cents(200)).unwrap()
    }

    #[test]
    fn test_address_setters_validate() {
        let mut a = home().with_line2("Near the park");
        assert_eq!(a.line2(), Some("Near the park"));

        a.update_city("Mysuru").unwrap();
        assert_eq!(a.city(), "Mysuru");

        assert!(a.update_zip_code("").is_err());
        assert_eq!(a.zip_code(), "560001");
        assert!(a.update_state("   ").is_err());
    }

    #[test]
    fn test_food_rejects_negative_price() {
        assert!(Food::new(1, "Refund", "n/a", Money::from_cents(-1)).is_err());

        let mut food = pizza();
        assert!(food.update_price(Money::from_cents(-5)).is_err());
        assert_eq!(food.price(), Money::from_cents(1000));

        food.update_quantity("1 medium");
        assert_eq!(food.quantity(), "1 medium");
    }

    #[test]
    fn test_user_profile_updates() {
        let mut user = User::register(1, "Ana", "ana@example.com", vec![], UserRole::customer()).unwrap();
        assert!(user.update_email("not-an-email").is_err());
        assert_eq!(user.email(), "ana@example.com");

        user.update_name("Ana Lopez").unwrap();
        assert_eq!(user.name(), "Ana Lopez");

        user.add_address(home());
        assert!(user.remove_address(1));
        assert!(!user.remove_address(1));
        assert!(user.addresses().is_empty());
    }

    #[test]
    fn test_cart_belongs_to_customers_only() {
        let mut customer = User::register(1, "Ana", "ana@example.com", vec![], UserRole::customer()).unwrap();
        let mut manager = User::register(2, "Luigi", "luigi@example.com", vec![], UserRole::HotelManager).unwrap();

        assert!(customer.add_to_cart(&pizza()));
        assert!(!manager.add_to_cart(&pizza()));
        assert_eq!(customer.cart().map(|c| c.len()), Some(1));
        assert!(manager.cart().is_none());

        customer.clear_cart();
        assert_eq!(customer.cart().map(|c| c.len()), Some(0));
    }

    #[test]
    fn test_place_order_creates_pending_order() {
        let user = User::register(1, "Ana", "ana@example.com", vec![home()], UserRole::customer()).unwrap();
        let restaurant = Restaurant::new(5, "Luigi's", vec![]).unwrap();
        let ids = SequentialIds::starting_at(100);

        let order = user.place_order(42, &restaurant, &[pizza(), soda()], "No onions", &ids, now());

        assert_eq!(order.id(), 42);
        assert_eq!(order.user_id(), 1);
        assert_eq!(order.restaurant_id(), 5);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.items()[0].id(), 100);
        assert_eq!(order.items()[1].quantity(), "330 ml");
        assert_eq!(order.total_price(), Money::from_cents(1200));
        assert_eq!(order.created_at(), now());
    }

    #[test]
    fn test_menu_management() {
        let mut restaurant = Restaurant::new(5, "Luigi's", vec![]).unwrap();
        restaurant.add_menu_item(pizza());
        restaurant.add_menu_item(soda());

        assert_eq!(restaurant.update_menu_item_price(10, Money::from_cents(1100)), Ok(true));
        assert_eq!(restaurant.update_menu_item_price(99, Money::from_cents(1100)), Ok(false));
        assert!(restaurant.update_menu_item_price(10, Money::from_cents(-1)).is_err());
        assert_eq!(restaurant.menu_item(10).map(Food::price), Some(Money::from_cents(1100)));

        assert!(restaurant.remove_menu_item(11));
        assert!(!restaurant.remove_menu_item(11));
        assert_eq!(restaurant.menu().len(), 1);
    }

    #[test]
    fn test_prepare_order_only_for_own_orders() {
        let restaurant = Restaurant::new(5, "Luigi's", vec![]).unwrap();
        let other = Restaurant::new(6, "Mario's", vec![]).unwrap();
        let mut order = Order::new(42, 1, 5, "", now());

        assert!(matches!(
            other.prepare_order(&mut order),
            Err(CoreError::ForeignOrder { order_id: 42, restaurant_id: 6 })
        ));
        assert_eq!(order.status(), OrderStatus::Pending);

        let change = restaurant.prepare_order(&mut order).unwrap();
        assert_eq!(change.to, OrderStatus::Preparing);
        assert_eq!(order.status(), OrderStatus::Preparing);
    }

    #[test]
    fn test_delivery_assignment() {
        let mut delivery = Delivery::new(1, 42, home());
        assert!(!delivery.is_assigned());
        assert!(delivery.assign_delivery_person("", "+91 99999").is_err());

        delivery.assign_delivery_person("Ravi", "+91 99999").unwrap();
        delivery.update_estimated_time(now());
        assert!(delivery.is_assigned());
        assert_eq!(delivery.estimated_delivery_time, Some(now()));
    }

    #[test]
    fn test_rating_range_enforced() {
        assert!(Rating::new(1, 0, "", 1, 5, now()).is_err());

        let mut rating = Rating::new(1, 4, "Great crust", 1, 5, now()).unwrap();
        let later = now() + chrono::Duration::days(1);
        assert!(rating.update_rating(9, "??", later).is_err());
        assert_eq!(rating.stars(), 4);

        rating.update_rating(5, "Even better", later).unwrap();
        assert_eq!(rating.stars(), 5);
        assert_eq!(rating.comment(), "Even better");
        assert_eq!(rating.review_date(), later);
    }
}
