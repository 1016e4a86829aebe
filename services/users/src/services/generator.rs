//! Synthetic user generation

use chrono::{Duration, NaiveDate};
use fake::{
    Fake,
    faker::{
        address::en::{CityName, CountryCode},
        company::en::CompanyName,
        internet::en::{SafeEmail, Username},
        job::en::Title,
        name::en::{FirstName, LastName},
        phone_number::en::CellNumber,
    },
};
use rand::{Rng, distributions::Alphanumeric};

use crate::models::{Role, UserRecord};

/// Shortest generated password
pub const MIN_PASSWORD_LEN: usize = 6;
/// Longest generated password
pub const MAX_PASSWORD_LEN: usize = 10;

/// Generate `count` random user records using the thread-local generator
pub fn generate_users(count: usize) -> Vec<UserRecord> {
    generate_users_with_rng(count, &mut rand::thread_rng())
}

/// Generate `count` random user records.
///
/// Records are not persisted and usernames are not guaranteed unique.
pub fn generate_users_with_rng<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<UserRecord> {
    (0..count).map(|_| generate_user(rng)).collect()
}

fn generate_user<R: Rng + ?Sized>(rng: &mut R) -> UserRecord {
    let username: String = Username().fake_with_rng(rng);
    let avatar = format!("https://robohash.org/{}.png", username);

    UserRecord {
        first_name: Some(FirstName().fake_with_rng(rng)),
        last_name: Some(LastName().fake_with_rng(rng)),
        birth_date: random_birth_date(rng),
        city: Some(CityName().fake_with_rng(rng)),
        country: Some(CountryCode().fake_with_rng(rng)),
        avatar: Some(avatar),
        company: Some(CompanyName().fake_with_rng(rng)),
        job_position: Some(Title().fake_with_rng(rng)),
        mobile: Some(CellNumber().fake_with_rng(rng)),
        username,
        email: Some(SafeEmail().fake_with_rng(rng)),
        password: random_password(rng),
        role: if rng.gen_bool(0.5) {
            Role::User
        } else {
            Role::Admin
        },
    }
}

/// Alphanumeric password with a length in `[MIN_PASSWORD_LEN, MAX_PASSWORD_LEN]`
pub fn random_password<R: Rng + ?Sized>(rng: &mut R) -> String {
    let length = rng.gen_range(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN);
    (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

fn random_birth_date<R: Rng + ?Sized>(rng: &mut R) -> Option<NaiveDate> {
    let earliest = NaiveDate::from_ymd_opt(1950, 1, 1)?;
    let latest = NaiveDate::from_ymd_opt(2005, 12, 31)?;
    let span = (latest - earliest).num_days();

    earliest.checked_add_signed(Duration::days(rng.gen_range(0..=span)))
}

/// Download file name for a generated batch
pub fn export_file_name(timestamp_millis: i64) -> String {
    format!("random_users_{}.json", timestamp_millis)
}
