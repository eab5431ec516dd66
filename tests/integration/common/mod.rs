#[allow(unused)]
mod setup;

#[allow(unused)]
pub use routes::*;
#[allow(unused)]
pub use setup::*;

/// Macro to create the test actix-web service from a database pool.
/// Usage: `let app = test_service!(db.pool);`
macro_rules! test_service {
    ($pool:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($pool.clone()))
                .configure(crate::common::configure_routes),
        )
        .await
    };
}

/// Macro to create a [`controller_harness::TestClient`] over the test routes.
/// Usage: `let mut client = test_client!(db.pool);`
macro_rules! test_client {
    ($pool:expr) => {
        controller_harness::TestClient::new(controller_harness::ActixDispatcher::new(
            test_service!($pool),
        ))
    };
}
