use axum::{
    routing::{delete, get, post, put, MethodRouter},
    Router, handler::Handler
};



/// Merges per-route components into one router and attaches the shared state.
/// Components registered on the same path with different methods are combined.
pub fn main_router<STATE>(components: Vec<(String, Router<STATE>)>, state: STATE) -> Router
where
    STATE: Clone + Send + Sync + 'static
{
    let mut app = Router::<STATE>::new();

    for (_, router) in components {
        app = app.merge(router);
    }

    app.with_state(state)
}


fn route_builder<S>(path: String, method_router: MethodRouter<S>) -> (String, Router<S>)
where
    S: Clone + Send + Sync + 'static,
{
    let app = Router::<S>::new().route(&path, method_router);
    (path, app)
}


pub fn get_router_builder<T, S>(
    path: String,
    handler: impl Handler<T, S>  + Clone + Send + 'static
) -> (String, Router<S>)
where
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    route_builder(path, get(handler))
}


pub fn post_router_builder<T, S>(
    path: String,
    handler: impl Handler<T, S>  + Clone + Send + 'static
) -> (String, Router<S>)
where
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    route_builder(path, post(handler))
}


pub fn put_router_builder<T, S>(
    path: String,
    handler: impl Handler<T, S>  + Clone + Send + 'static
) -> (String, Router<S>)
where
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    route_builder(path, put(handler))
}


pub fn delete_router_builder<T, S>(
    path: String,
    handler: impl Handler<T, S>  + Clone + Send + 'static
) -> (String, Router<S>)
where
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    route_builder(path, delete(handler))
}
