#[macro_use]
extern crate rocket;

#[launch]
fn rocket() -> _ {
    let rocket = accounts_api::rocket();
    log::info!("starting accounts API server");
    rocket
}
