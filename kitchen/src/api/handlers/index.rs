use axum::{extract::State, response::Html};
use minijinja::context;

use crate::{
    AppState,
    api::{handlers::acquire, models::cooks::CurrentUser},
    db::handlers::{
        Cooks, DishTypes, Dishes, Repository, cooks::CookFilter, dish_types::DishTypeFilter, dishes::DishFilter,
    },
    errors::Result,
};

/// Landing page with the number of cooks, dishes and dish types.
#[tracing::instrument(skip_all)]
pub async fn index(State(state): State<AppState>, current_user: CurrentUser) -> Result<Html<String>> {
    let mut conn = acquire(&state).await?;

    let num_cooks = Cooks::new(&mut conn).count(&CookFilter::new(0, 0)).await?;
    let num_dishes = Dishes::new(&mut conn).count(&DishFilter::new(0, 0)).await?;
    let num_dish_types = DishTypes::new(&mut conn).count(&DishTypeFilter::new(0, 0)).await?;
    drop(conn);

    state.templates.render(
        "index.html",
        Some(&current_user),
        context! { title => "Home", num_cooks, num_dishes, num_dish_types },
    )
}
