/*!
# Postagg API documentation

This page describes the API endpoints available on Postagg.

## Posts

Endpoint: `/api/posts`

Example: `/api/posts?tags=tech,history&sortBy=likes&direction=desc`

Lists the blog posts carrying any of the requested tags. The upstream API is
queried once per tag, and the results are merged so that each post appears
once. When a post carries several of the requested tags, the copy from the
first tag listed in the request is kept.

### Query Parameters

- `tags` - Required. A comma separated list of tags, such as `tech,history`.
  Repeated tags are only queried once.
- `sortBy` - Optional. One of `id`, `reads`, `likes` or `popularity`. Defaults
  to `id`.
- `direction` - Optional. `asc` or `desc`. Defaults to `asc`.

Posts with equal values for the sort field keep the order they were merged
in, in both directions.

### Response

A JSON object with a single key, `posts`, holding a list of post objects. Each
post object has the following keys, in this order:

- `author` - The name of the author.
- `authorId` - The identifier of the author.
- `id` - The identifier of the post.
- `likes` - The number of likes.
- `popularity` - A popularity score between 0 and 1.
- `reads` - The number of reads.
- `tags` - The tags of the post.

The `X-Cache` header reports whether the upstream responses came from the
in-memory cache: `hit`, `miss`, `mixed` or `no-cache`.

### Errors

Errors are JSON objects with a single key, `error`.

- `400` - A parameter is invalid. Only the first problem is reported, checking
  `tags`, then `sortBy`, then `direction`. The messages are
  `Tags parameter is required`, `sortBy parameter is invalid` and
  `direction parameter is invalid`.
- `502` - The upstream API failed, timed out, or answered with an unexpected
  document. The message is `Upstream post source is unavailable`.
- `500` - Anything else. The message is `Internal error`.

## Ping

Endpoint: `/api/ping`

Always answers `200` with exactly `{"success": true}`.

## Self-test

Endpoint: `/api/tests`

Sends a fixed list of requests to this instance's own API, and answers with a
JSON object mapping each case name to `Passed` or `Failed`, in the order the
cases ran. The cases cover rejected parameters, ping, the sort order for each
field, and the tags of the returned posts. A case that cannot get a response
fails on its own without affecting the others.

## Dockerflow

Postagg implements the
[Dockerflow](https://github.com/mozilla-services/Dockerflow) endpoints:

- `/__lbheartbeat__` - An empty `200` response, for load balancers.
- `/__heartbeat__` - A JSON object with the running `version`.
- `/__version__` - The contents of `version.json`, describing the build.
*/
